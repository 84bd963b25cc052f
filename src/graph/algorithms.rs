//! Graph algorithms for analysis

use petgraph::graph::UnGraph;
use serde::{Serialize, Deserialize};

use crate::graph::builder::canonicalize_undirected;
use crate::graph::{CompressedGraph, DirectedGraph, Edge, UndirectedGraph};

/// How a directed graph is turned into an undirected one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymmetrizeMode {
    /// Keep an undirected edge when either direction exists
    #[default]
    Union,
    /// Keep an undirected edge only when both directions exist
    Mutual,
}

/// Count connected components, treating every edge as undirected
pub fn connected_components(graph: &CompressedGraph) -> usize {
    let mut g = UnGraph::<(), ()>::with_capacity(graph.vertex_count(), graph.edge_count());
    for _ in 0..graph.vertex_count() {
        g.add_node(());
    }
    g.extend_with_edges(graph.edges().map(|e| (e.src, e.dst)));

    petgraph::algo::connected_components(&g)
}

/// Convert a directed graph to an undirected one.
///
/// The weight of an undirected edge is taken from the first directed edge
/// seen for that vertex pair. Vertex numbering and external IDs are kept.
pub fn symmetrize(graph: &DirectedGraph, mode: SymmetrizeMode) -> UndirectedGraph {
    log::info!("Symmetrizing directed graph ({:?})", mode);

    let kept: Vec<Edge> = match mode {
        SymmetrizeMode::Union => graph.edges().copied().collect(),
        SymmetrizeMode::Mutual => graph
            .edges()
            .filter(|edge| {
                // Self-loops are their own reverse
                edge.is_self_loop() || graph.has_edge(edge.dst as usize, edge.src)
            })
            .copied()
            .collect(),
    };

    let edges = canonicalize_undirected(kept);
    log::info!("Found {} undirected edges", edges.len());

    let csr = CompressedGraph::undirected(
        graph.vertex_count(),
        edges,
        graph.is_weighted(),
        graph.node_ids.clone(),
    );
    UndirectedGraph::from_compressed(csr)
}
