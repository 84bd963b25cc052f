//! Error types for graph construction, clustering and scoring

use crate::graph::GraphKind;

/// Errors raised by the clustering pipeline
#[derive(Debug, thiserror::Error)]
pub enum ClusteringError {
    /// The graph has the wrong directedness for the requested operation
    #[error("expected {expected} graph, found {found} graph")]
    GraphType {
        expected: GraphKind,
        found: GraphKind,
    },

    /// Malformed edge list or vertex set
    #[error("invalid graph: {0}")]
    InvalidGraph(String),

    /// Bad partition count or solver parameter
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An iterative stage ran out of its iteration budget
    #[error(
        "{stage} did not converge after {iterations} iterations (residual={residual:.2e}, tol={tolerance:.2e})"
    )]
    Convergence {
        stage: &'static str,
        iterations: usize,
        residual: f64,
        tolerance: f64,
    },

    /// Cluster labels do not cover the graph or fall outside [0, k)
    #[error("invalid assignment: {0}")]
    InvalidAssignment(String),

    #[error("data error: {0}")]
    Data(#[from] polars::prelude::PolarsError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Thread pool could not be (re)initialized
    #[error("runtime error: {0}")]
    Runtime(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, ClusteringError>;
