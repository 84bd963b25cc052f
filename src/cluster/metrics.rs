//! Partition quality scores and cluster statistics

use rayon::prelude::*;

use crate::cluster::{Cluster, ClusterAssignment};
use crate::error::{ClusteringError, Result};
use crate::graph::{CompressedGraph, Edge};

/// Edges are scored in fixed-size chunks so float sums do not depend on scheduling
const EDGE_CHUNK_SIZE: usize = 16_384;

/// Number of central nodes reported per cluster
const CENTRAL_NODE_COUNT: usize = 5;

/// Check that `labels` covers every vertex with ids in [0, k)
pub fn validate_assignment(graph: &CompressedGraph, k: usize, labels: &[u32]) -> Result<()> {
    if k == 0 {
        return Err(ClusteringError::InvalidAssignment(
            "cluster count must be positive".into(),
        ));
    }
    if labels.len() != graph.vertex_count() {
        return Err(ClusteringError::InvalidAssignment(format!(
            "assignment has {} labels for {} vertices",
            labels.len(),
            graph.vertex_count()
        )));
    }
    if let Some(vertex) = labels.iter().position(|&l| l as usize >= k) {
        return Err(ClusteringError::InvalidAssignment(format!(
            "vertex {} has cluster id {} outside [0, {})",
            vertex, labels[vertex], k
        )));
    }
    Ok(())
}

/// Total weight of edges whose endpoints lie in different clusters
pub fn edge_cut(graph: &CompressedGraph, k: usize, labels: &[u32]) -> Result<f64> {
    validate_assignment(graph, k, labels)?;

    let crossing = |edge: &Edge| {
        if labels[edge.src as usize] != labels[edge.dst as usize] {
            edge.weight()
        } else {
            0.0
        }
    };

    let chunk_sums: Vec<f64> = graph
        .edge_list
        .par_chunks(EDGE_CHUNK_SIZE)
        .map(|chunk| chunk.iter().map(crossing).sum::<f64>())
        .collect();

    Ok(chunk_sums.iter().sum())
}

/// Sum over non-empty clusters of (weight leaving the cluster) / (cluster size)
pub fn ratio_cut(graph: &CompressedGraph, k: usize, labels: &[u32]) -> Result<f64> {
    validate_assignment(graph, k, labels)?;

    let mut cut = vec![0.0; k];
    for edge in graph.edges() {
        let (a, b) = (labels[edge.src as usize] as usize, labels[edge.dst as usize] as usize);
        if a != b {
            cut[a] += edge.weight();
            cut[b] += edge.weight();
        }
    }

    let mut sizes = vec![0usize; k];
    for &label in labels {
        sizes[label as usize] += 1;
    }

    Ok(cut
        .iter()
        .zip(&sizes)
        .filter(|(_, &size)| size > 0)
        .map(|(c, &size)| c / size as f64)
        .sum())
}

/// Newman modularity of the partition; edges are treated as undirected
pub fn modularity(graph: &CompressedGraph, k: usize, labels: &[u32]) -> Result<f64> {
    validate_assignment(graph, k, labels)?;

    let total = graph.total_weight();
    if total <= 0.0 {
        return Ok(0.0);
    }

    let mut internal = vec![0.0; k];
    let mut volume = vec![0.0; k];
    for edge in graph.edges() {
        let (a, b) = (labels[edge.src as usize] as usize, labels[edge.dst as usize] as usize);
        let w = edge.weight();
        if a == b {
            internal[a] += w;
        }
        volume[a] += w;
        volume[b] += w;
    }

    Ok(internal
        .iter()
        .zip(&volume)
        .map(|(&inside, &vol)| inside / total - (vol / (2.0 * total)).powi(2))
        .sum())
}

/// Per-cluster statistics for a partition
pub fn summarize_clusters(graph: &CompressedGraph, assignment: &ClusterAssignment) -> Result<Vec<Cluster>> {
    let labels = assignment.labels();
    validate_assignment(graph, assignment.k(), labels)?;

    let k = assignment.k();
    let mut internal_weight = vec![0.0; k];
    let mut internal_edges = vec![0usize; k];
    let mut cut_weight = vec![0.0; k];
    let mut internal_degree = vec![0.0; graph.vertex_count()];

    for edge in graph.edges() {
        let (a, b) = (labels[edge.src as usize] as usize, labels[edge.dst as usize] as usize);
        let w = edge.weight();
        if a == b {
            internal_weight[a] += w;
            if !edge.is_self_loop() {
                internal_edges[a] += 1;
                internal_degree[edge.src as usize] += w;
                internal_degree[edge.dst as usize] += w;
            }
        } else {
            cut_weight[a] += w;
            cut_weight[b] += w;
        }
    }

    let clusters = assignment
        .members()
        .into_iter()
        .enumerate()
        .map(|(id, members)| {
            let size = members.len();
            let density = if size <= 1 {
                1.0 // By convention, singleton clusters have density 1
            } else {
                internal_edges[id] as f64 / (size * (size - 1) / 2) as f64
            };

            let mut by_degree: Vec<u32> = members.clone();
            by_degree.sort_by(|&a, &b| {
                internal_degree[b as usize]
                    .total_cmp(&internal_degree[a as usize])
                    .then(a.cmp(&b))
            });
            by_degree.truncate(CENTRAL_NODE_COUNT);

            Cluster {
                id: id as u32,
                members,
                size,
                internal_weight: internal_weight[id],
                cut_weight: cut_weight[id],
                density,
                central_nodes: by_degree,
            }
        })
        .collect();

    Ok(clusters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Graph, GraphBuilder};
    use approx::assert_abs_diff_eq;

    /// Two triangles {0,1,2} and {3,4,5} joined by the edge 2-3
    fn two_triangles(weighted: bool) -> Graph {
        let edges = [(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5), (2, 3)];
        let mut builder = GraphBuilder::undirected();
        for (i, &(u, v)) in edges.iter().enumerate() {
            if weighted {
                builder.add_weighted_edge(u, v, 1.0 + i as f64);
            } else {
                builder.add_edge(u, v);
            }
        }
        builder.build().unwrap()
    }

    #[test]
    fn counts_crossing_edges() {
        let graph = two_triangles(false);
        assert_eq!(edge_cut(&graph, 2, &[0, 0, 0, 1, 1, 1]).unwrap(), 1.0);
        assert_eq!(edge_cut(&graph, 2, &[0, 0, 0, 0, 0, 0]).unwrap(), 0.0);
        assert_eq!(edge_cut(&graph, 6, &[0, 1, 2, 3, 4, 5]).unwrap(), 7.0);
    }

    #[test]
    fn sums_crossing_weights() {
        let graph = two_triangles(true);
        assert_eq!(edge_cut(&graph, 2, &[0, 0, 0, 1, 1, 1]).unwrap(), 7.0);
        assert_eq!(edge_cut(&graph, 2, &[1, 0, 0, 0, 0, 0]).unwrap(), 1.0 + 3.0);
    }

    #[test]
    fn score_ignores_cluster_names() {
        let graph = two_triangles(true);
        let assignment = ClusterAssignment::new(vec![0, 1, 2, 2, 1, 0], 3).unwrap();
        let relabeled = assignment.relabel(&[2, 0, 1]).unwrap();
        assert_eq!(
            edge_cut(&graph, 3, assignment.labels()).unwrap(),
            edge_cut(&graph, 3, relabeled.labels()).unwrap()
        );
    }

    #[test]
    fn rejects_malformed_assignments() {
        let graph = two_triangles(false);
        assert!(matches!(
            edge_cut(&graph, 2, &[0, 0, 0]),
            Err(ClusteringError::InvalidAssignment(_))
        ));
        assert!(matches!(
            edge_cut(&graph, 2, &[0, 0, 0, 1, 1, 2]),
            Err(ClusteringError::InvalidAssignment(_))
        ));
        assert!(matches!(
            edge_cut(&graph, 0, &[0; 6]),
            Err(ClusteringError::InvalidAssignment(_))
        ));
    }

    #[test]
    fn directed_edges_count_once() {
        let mut builder = GraphBuilder::directed();
        builder.add_edge(0, 1);
        builder.add_edge(1, 0);
        let graph = builder.build().unwrap();
        assert_eq!(edge_cut(&graph, 2, &[0, 1]).unwrap(), 2.0);
    }

    #[test]
    fn ratio_cut_divides_by_cluster_size() {
        let graph = two_triangles(false);
        assert_abs_diff_eq!(ratio_cut(&graph, 2, &[0, 0, 0, 1, 1, 1]).unwrap(), 2.0 / 3.0);
        // Empty cluster 2 is skipped
        assert_abs_diff_eq!(ratio_cut(&graph, 3, &[0, 0, 0, 1, 1, 1]).unwrap(), 2.0 / 3.0);
    }

    #[test]
    fn modularity_of_natural_split() {
        let graph = two_triangles(false);
        let q = modularity(&graph, 2, &[0, 0, 0, 1, 1, 1]).unwrap();
        assert_abs_diff_eq!(q, 5.0 / 14.0, epsilon = 1e-12);
        let single = modularity(&graph, 1, &[0; 6]).unwrap();
        assert_abs_diff_eq!(single, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn summarizes_clusters() {
        let graph = two_triangles(false);
        let assignment = ClusterAssignment::new(vec![0, 0, 0, 1, 1, 1], 2).unwrap();
        let clusters = summarize_clusters(&graph, &assignment).unwrap();

        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].size, 3);
        assert_eq!(clusters[0].internal_weight, 3.0);
        assert_eq!(clusters[0].cut_weight, 1.0);
        assert_eq!(clusters[0].density, 1.0);
        // Ties on internal degree resolve to the lower vertex id
        assert_eq!(clusters[0].central_nodes, vec![0, 1, 2]);
        assert_eq!(clusters[1].members, vec![3, 4, 5]);
    }
}
