//! Configuration management for the balanced cut analyzer

use serde::{Serialize, Deserialize};

use crate::graph::laplacian::LaplacianKind;

/// Parameters of the spectral balanced-cut clusterer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Number of Laplacian eigenvectors to embed with (defaults to k)
    pub num_eigen_vectors: Option<usize>,

    /// Laplacian used for the embedding
    pub laplacian: LaplacianKind,

    /// Relative residual at which the eigensolver stops
    pub eigen_tolerance: f64,

    /// Iteration budget of the eigensolver
    pub eigen_max_iter: usize,

    /// Graphs up to this many vertices are diagonalized densely
    pub dense_threshold: usize,

    /// Centroid movement at which k-means stops
    pub kmeans_tolerance: f64,

    /// Iteration budget of k-means
    pub kmeans_max_iter: usize,

    /// Independent k-means restarts; the lowest inertia wins
    pub kmeans_restarts: usize,

    /// Allowed relative excess of a cluster over n / k
    pub balance_tolerance: f64,

    /// Seed for the eigensolver start block and k-means seeding
    pub seed: u64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            num_eigen_vectors: None,
            laplacian: LaplacianKind::Normalized,
            eigen_tolerance: 1e-5,
            eigen_max_iter: 4000,
            dense_threshold: 200,
            kmeans_tolerance: 1e-5,
            kmeans_max_iter: 100,
            kmeans_restarts: 4,
            balance_tolerance: 0.1,
            seed: 0,
        }
    }
}

impl ClusteringConfig {
    pub fn with_laplacian(mut self, laplacian: LaplacianKind) -> Self {
        self.laplacian = laplacian;
        self
    }

    pub fn with_num_eigen_vectors(mut self, count: usize) -> Self {
        self.num_eigen_vectors = Some(count);
        self
    }

    pub fn with_dense_threshold(mut self, threshold: usize) -> Self {
        self.dense_threshold = threshold;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
