//! Core library functions for the balanced cut analyzer

pub mod cluster;
pub mod config;
pub mod data;
pub mod error;
pub mod evaluate;
pub mod graph;
pub mod runtime;
pub mod storage;

pub use cluster::ClusterAssignment;
pub use config::ClusteringConfig;
pub use error::{ClusteringError, Result};
pub use evaluate::{evaluate, EvaluationReport};
pub use graph::{Graph, GraphBuilder, GraphKind};
pub use runtime::{ContextOptions, ExecutionContext};
