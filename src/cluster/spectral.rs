//! Spectral balanced-cut clustering

use itertools::Itertools;
use ndarray::Array2;

use crate::cluster::eigen::{smallest_eigenpairs, EigenSolverOptions};
use crate::cluster::kmeans::BalancedKMeans;
use crate::cluster::ClusterAssignment;
use crate::config::ClusteringConfig;
use crate::error::{ClusteringError, Result};
use crate::graph::algorithms::connected_components;
use crate::graph::laplacian::{LaplacianKind, LaplacianOperator};
use crate::graph::{Graph, UndirectedGraph};

/// Partitions an undirected graph into k clusters of roughly equal size
/// with few edges between them.
///
/// The vertices are embedded with the eigenvectors of the smallest
/// Laplacian eigenvalues and grouped with balanced k-means.
#[derive(Debug, Clone, Default)]
pub struct SpectralBalancedCut {
    config: ClusteringConfig,
}

impl SpectralBalancedCut {
    pub fn new(config: ClusteringConfig) -> Self {
        Self { config }
    }

    /// Cluster `graph` into `k` parts
    pub fn cluster(&self, graph: &UndirectedGraph, k: usize) -> Result<ClusterAssignment> {
        let n = graph.vertex_count();
        if k < 2 || k > n {
            return Err(ClusteringError::InvalidArgument(format!(
                "partition count {} must lie in [2, {}]",
                k, n
            )));
        }
        let eigen_vectors = self.config.num_eigen_vectors.unwrap_or(k);
        if eigen_vectors == 0 || eigen_vectors > n {
            return Err(ClusteringError::InvalidArgument(format!(
                "eigenvector count {} must lie in [1, {}]",
                eigen_vectors, n
            )));
        }

        log::info!(
            "Spectral balanced cut: {} vertices, {} edges, k={}, {} eigenvectors",
            n,
            graph.edge_count(),
            k,
            eigen_vectors
        );

        let components = connected_components(graph);
        if components > 1 {
            log::warn!("Graph has {} connected components", components);
        }

        let op = LaplacianOperator::new(graph, self.config.laplacian);
        let pairs = smallest_eigenpairs(&op, eigen_vectors, &self.eigen_options())?;
        log::debug!(
            "Smallest eigenvalues after {} iterations: {:?}",
            pairs.iterations,
            pairs.values
        );

        let embedding = spectral_embedding(&op, pairs.vectors);
        let outcome = self.kmeans(k).fit(embedding.view())?;

        let assignment = ClusterAssignment::new(outcome.labels, k)?;
        log::info!(
            "Cluster sizes: [{}]",
            assignment.cluster_sizes().iter().join(", ")
        );

        Ok(assignment)
    }

    fn eigen_options(&self) -> EigenSolverOptions {
        EigenSolverOptions {
            tolerance: self.config.eigen_tolerance,
            max_iter: self.config.eigen_max_iter,
            dense_threshold: self.config.dense_threshold,
            seed: self.config.seed,
        }
    }

    fn kmeans(&self, k: usize) -> BalancedKMeans {
        BalancedKMeans {
            clusters: k,
            max_iter: self.config.kmeans_max_iter,
            tolerance: self.config.kmeans_tolerance,
            balance_tolerance: self.config.balance_tolerance,
            restarts: self.config.kmeans_restarts,
            seed: self.config.seed,
        }
    }
}

/// Cluster any graph; directed graphs are rejected before numeric work
pub fn spectral_balanced_cut_clustering(
    graph: &Graph,
    k: usize,
    config: &ClusteringConfig,
) -> Result<ClusterAssignment> {
    let undirected = graph.as_undirected()?;
    SpectralBalancedCut::new(config.clone()).cluster(undirected, k)
}

/// Rows of the eigenvector block, rescaled by D^-1/2 for the normalized
/// Laplacian so the trivial eigenvector becomes constant.
pub fn spectral_embedding(op: &LaplacianOperator<'_>, vectors: Array2<f64>) -> Array2<f64> {
    let mut embedding = vectors;
    if op.kind() == LaplacianKind::Normalized {
        for (mut row, &s) in embedding.outer_iter_mut().zip(op.inv_sqrt_degrees()) {
            // Isolated vertices keep their indicator entry
            if s > 0.0 {
                row *= s;
            }
        }
    }
    embedding
}
