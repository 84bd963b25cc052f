//! Graph construction module

use std::collections::{HashMap, HashSet};
use std::collections::hash_map::Entry;

use crate::error::{ClusteringError, Result};
use crate::graph::compressed::{CompressedGraph, Edge};
use crate::graph::{DirectedGraph, Graph, GraphKind, UndirectedGraph};

/// Builder for incrementally constructing a Graph from an edge list
pub struct GraphBuilder {
    /// Directedness of the graph being built
    kind: GraphKind,

    /// Remap arbitrary vertex IDs to a dense 0-based range
    renumber: bool,

    /// Declared vertex count when renumbering is off
    vertex_count: Option<usize>,

    /// Mapping from external IDs to node indices
    id_to_index: HashMap<i64, u32>,

    /// External ID of each node, in order of first appearance
    node_ids: Vec<i64>,

    /// Edges as supplied, in external IDs
    raw_edges: Vec<(i64, i64, Option<f64>)>,
}

impl GraphBuilder {
    pub fn new(kind: GraphKind) -> Self {
        Self {
            kind,
            renumber: true,
            vertex_count: None,
            id_to_index: HashMap::new(),
            node_ids: Vec::new(),
            raw_edges: Vec::new(),
        }
    }

    pub fn undirected() -> Self {
        Self::new(GraphKind::Undirected)
    }

    pub fn directed() -> Self {
        Self::new(GraphKind::Directed)
    }

    /// Toggle renumbering of vertex IDs (on by default)
    pub fn renumber(mut self, renumber: bool) -> Self {
        self.renumber = renumber;
        self
    }

    /// Declare the vertex set as [0, count); requires `renumber(false)`
    pub fn with_vertex_count(mut self, count: usize) -> Self {
        self.vertex_count = Some(count);
        self
    }

    /// Reserve room for the given number of edges
    pub fn with_capacity(mut self, edges: usize) -> Self {
        self.raw_edges.reserve(edges);
        self.id_to_index.reserve(edges);
        self
    }

    /// Add an unweighted edge
    pub fn add_edge(&mut self, src: i64, dst: i64) {
        self.raw_edges.push((src, dst, None));
    }

    /// Add an edge with a weight
    pub fn add_weighted_edge(&mut self, src: i64, dst: i64, weight: f64) {
        self.raw_edges.push((src, dst, Some(weight)));
    }

    /// Get or create a node index for the given external ID
    fn get_or_create_node(&mut self, id: i64) -> u32 {
        match self.id_to_index.entry(id) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let idx = self.node_ids.len() as u32;
                self.node_ids.push(id);
                *entry.insert(idx)
            }
        }
    }

    /// Build the graph, validating the edge list
    pub fn build(mut self) -> Result<Graph> {
        if let (true, Some(count)) = (self.renumber, self.vertex_count) {
            return Err(ClusteringError::InvalidGraph(format!(
                "declared vertex count {} cannot be enforced while renumbering",
                count
            )));
        }

        let weighted = self.raw_edges.first().map_or(false, |e| e.2.is_some());
        if self.raw_edges.iter().any(|e| e.2.is_some() != weighted) {
            return Err(ClusteringError::InvalidGraph(
                "edge list mixes weighted and unweighted edges".into(),
            ));
        }
        if let Some(&(src, dst, Some(w))) = self
            .raw_edges
            .iter()
            .find(|e| e.2.map_or(false, |w| !w.is_finite() || w < 0.0))
        {
            return Err(ClusteringError::InvalidGraph(format!(
                "edge ({}, {}) has invalid weight {}",
                src, dst, w
            )));
        }

        let raw_edges = std::mem::take(&mut self.raw_edges);
        let (node_count, node_ids, mut edges) = if self.renumber {
            let edges: Vec<Edge> = raw_edges
                .iter()
                .map(|&(src, dst, weight)| Edge {
                    src: self.get_or_create_node(src),
                    dst: self.get_or_create_node(dst),
                    weight,
                })
                .collect();
            let node_ids = std::mem::take(&mut self.node_ids);
            (node_ids.len(), Some(node_ids), edges)
        } else {
            let node_count = match self.vertex_count {
                Some(count) => count,
                None => {
                    let max_id = raw_edges.iter().map(|e| e.0.max(e.1)).max().unwrap_or(-1);
                    let count = max_id.checked_add(1).ok_or_else(|| {
                        ClusteringError::InvalidGraph(format!("vertex id {} is out of range", max_id))
                    })?;
                    count.max(0) as usize
                }
            };
            let mut edges = Vec::with_capacity(raw_edges.len());
            for &(src, dst, weight) in &raw_edges {
                let in_range = |v: i64| v >= 0 && (v as u64) < node_count as u64;
                if !in_range(src) || !in_range(dst) {
                    return Err(ClusteringError::InvalidGraph(format!(
                        "edge ({}, {}) references a vertex outside [0, {})",
                        src, dst, node_count
                    )));
                }
                edges.push(Edge { src: src as u32, dst: dst as u32, weight });
            }
            (node_count, None, edges)
        };

        if node_count == 0 {
            return Err(ClusteringError::InvalidGraph("graph has no vertices".into()));
        }
        if node_count > u32::MAX as usize {
            return Err(ClusteringError::InvalidGraph(format!(
                "{} vertices exceed the 32-bit index range",
                node_count
            )));
        }

        let graph = match self.kind {
            GraphKind::Undirected => {
                let before = edges.len();
                edges = canonicalize_undirected(edges);
                if edges.len() < before {
                    log::debug!(
                        "Collapsed {} duplicate or reversed edges",
                        before - edges.len()
                    );
                }
                let csr = CompressedGraph::undirected(node_count, edges, weighted, node_ids);
                Graph::Undirected(UndirectedGraph::from_compressed(csr))
            }
            GraphKind::Directed => {
                let csr = CompressedGraph::directed(node_count, edges, weighted, node_ids);
                Graph::Directed(DirectedGraph::from_compressed(csr))
            }
        };

        log::debug!(
            "Built {} graph with {} vertices and {} edges",
            graph.kind(),
            graph.vertex_count(),
            graph.edge_count()
        );

        Ok(graph)
    }
}

/// Orient every edge as (min, max) and keep the first occurrence of each pair
pub(crate) fn canonicalize_undirected(edges: Vec<Edge>) -> Vec<Edge> {
    let mut seen: HashSet<(u32, u32)> = HashSet::with_capacity(edges.len());
    edges
        .into_iter()
        .filter_map(|edge| {
            let (src, dst) = if edge.src <= edge.dst {
                (edge.src, edge.dst)
            } else {
                (edge.dst, edge.src)
            };
            seen.insert((src, dst))
                .then_some(Edge { src, dst, weight: edge.weight })
        })
        .collect()
}
