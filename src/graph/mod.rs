//! Graph representation and algorithms module

pub mod compressed;
pub mod builder;
pub mod algorithms;
pub mod laplacian;

use std::fmt;
use std::ops::Deref;

use serde::{Serialize, Deserialize};

use crate::error::{ClusteringError, Result};

pub use builder::GraphBuilder;
pub use compressed::{CompressedGraph, Edge};

/// Directedness of a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphKind {
    Undirected,
    Directed,
}

impl fmt::Display for GraphKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphKind::Undirected => write!(f, "undirected"),
            GraphKind::Directed => write!(f, "directed"),
        }
    }
}

/// Undirected graph: the only input the spectral clusterer accepts
#[derive(Debug, Clone)]
pub struct UndirectedGraph(CompressedGraph);

impl UndirectedGraph {
    pub(crate) fn from_compressed(graph: CompressedGraph) -> Self {
        Self(graph)
    }
}

impl Deref for UndirectedGraph {
    type Target = CompressedGraph;

    fn deref(&self) -> &CompressedGraph {
        &self.0
    }
}

/// Directed graph: can be scored, but must be symmetrized before clustering
#[derive(Debug, Clone)]
pub struct DirectedGraph(CompressedGraph);

impl DirectedGraph {
    pub(crate) fn from_compressed(graph: CompressedGraph) -> Self {
        Self(graph)
    }
}

impl Deref for DirectedGraph {
    type Target = CompressedGraph;

    fn deref(&self) -> &CompressedGraph {
        &self.0
    }
}

/// A graph tagged with its directedness
#[derive(Debug, Clone)]
pub enum Graph {
    Undirected(UndirectedGraph),
    Directed(DirectedGraph),
}

impl Graph {
    pub fn kind(&self) -> GraphKind {
        match self {
            Graph::Undirected(_) => GraphKind::Undirected,
            Graph::Directed(_) => GraphKind::Directed,
        }
    }

    pub fn is_directed(&self) -> bool {
        self.kind() == GraphKind::Directed
    }

    /// Borrow as an undirected graph, or fail with a graph type error
    pub fn as_undirected(&self) -> Result<&UndirectedGraph> {
        match self {
            Graph::Undirected(graph) => Ok(graph),
            Graph::Directed(_) => Err(ClusteringError::GraphType {
                expected: GraphKind::Undirected,
                found: GraphKind::Directed,
            }),
        }
    }

    pub fn compressed(&self) -> &CompressedGraph {
        match self {
            Graph::Undirected(graph) => &graph.0,
            Graph::Directed(graph) => &graph.0,
        }
    }
}

impl Deref for Graph {
    type Target = CompressedGraph;

    fn deref(&self) -> &CompressedGraph {
        self.compressed()
    }
}

impl From<UndirectedGraph> for Graph {
    fn from(graph: UndirectedGraph) -> Self {
        Graph::Undirected(graph)
    }
}
