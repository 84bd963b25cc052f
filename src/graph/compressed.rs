//! Memory-efficient graph representation

use std::mem;
use serde::{Serialize, Deserialize};

/// A single edge as it was supplied to the builder (after renumbering)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub src: u32,
    pub dst: u32,
    pub weight: Option<f64>,
}

impl Edge {
    /// Edge weight, 1.0 when the graph is unweighted
    pub fn weight(&self) -> f64 {
        self.weight.unwrap_or(1.0)
    }

    pub fn is_self_loop(&self) -> bool {
        self.src == self.dst
    }
}

/// Compressed sparse row representation of a graph optimized for memory efficiency
///
/// Undirected graphs store every edge in both directions in the CSR arrays
/// and once (with `src <= dst`) in `edge_list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressedGraph {
    /// Number of nodes in the graph
    pub node_count: usize,

    /// Offset array: index where each node's edges begin
    /// offsets[i] to offsets[i+1] defines the edge range for node i
    pub offsets: Vec<u32>,

    /// Edge array: concatenated, sorted lists of target nodes
    pub targets: Vec<u32>,

    /// Per-slot weights parallel to `targets`, absent for unweighted graphs
    pub weights: Option<Vec<f64>>,

    /// Canonical edge list used for scoring and iteration
    pub edge_list: Vec<Edge>,

    /// Optional mapping from internal node IDs to original vertex IDs
    pub node_ids: Option<Vec<i64>>,
}

impl CompressedGraph {
    /// Create a new graph with pre-allocated capacity
    pub fn with_capacity(node_count: usize, edge_count: usize) -> Self {
        Self {
            node_count,
            offsets: Vec::with_capacity(node_count + 1),
            targets: Vec::with_capacity(edge_count),
            weights: None,
            edge_list: Vec::with_capacity(edge_count),
            node_ids: None,
        }
    }

    /// Build the CSR arrays from (src, dst, weight) slots.
    ///
    /// Slots are sorted by (src, dst) so adjacency lists support binary search.
    pub(crate) fn from_slots(
        node_count: usize,
        mut slots: Vec<(u32, u32, f64)>,
        weighted: bool,
        edge_list: Vec<Edge>,
        node_ids: Option<Vec<i64>>,
    ) -> Self {
        slots.sort_unstable_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut graph = CompressedGraph::with_capacity(node_count, slots.len());

        // Count degree of each node to set up offsets
        let mut degrees = vec![0u32; node_count];
        for &(src, _, _) in &slots {
            degrees[src as usize] += 1;
        }

        graph.offsets.push(0);
        let mut offset = 0;
        for &degree in &degrees {
            offset += degree;
            graph.offsets.push(offset);
        }

        let mut weights = Vec::with_capacity(if weighted { slots.len() } else { 0 });
        for (_, dst, weight) in slots {
            graph.targets.push(dst);
            if weighted {
                weights.push(weight);
            }
        }

        graph.weights = weighted.then_some(weights);
        graph.edge_list = edge_list;
        graph.node_ids = node_ids;
        graph
    }

    /// Build a symmetric CSR from canonical undirected edges
    pub(crate) fn undirected(
        node_count: usize,
        edge_list: Vec<Edge>,
        weighted: bool,
        node_ids: Option<Vec<i64>>,
    ) -> Self {
        let mut slots = Vec::with_capacity(edge_list.len() * 2);
        for edge in &edge_list {
            slots.push((edge.src, edge.dst, edge.weight()));
            if !edge.is_self_loop() {
                slots.push((edge.dst, edge.src, edge.weight()));
            }
        }
        Self::from_slots(node_count, slots, weighted, edge_list, node_ids)
    }

    /// Build an outgoing-edge CSR from directed edges
    pub(crate) fn directed(
        node_count: usize,
        edge_list: Vec<Edge>,
        weighted: bool,
        node_ids: Option<Vec<i64>>,
    ) -> Self {
        let slots = edge_list
            .iter()
            .map(|edge| (edge.src, edge.dst, edge.weight()))
            .collect();
        Self::from_slots(node_count, slots, weighted, edge_list, node_ids)
    }

    pub fn vertex_count(&self) -> usize {
        self.node_count
    }

    /// Number of edges in the canonical edge list
    pub fn edge_count(&self) -> usize {
        self.edge_list.len()
    }

    pub fn is_weighted(&self) -> bool {
        self.weights.is_some()
    }

    /// Iterate over the canonical edge list
    pub fn edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edge_list.iter()
    }

    /// Get outgoing edges for a node
    pub fn outgoing_edges(&self, node: usize) -> &[u32] {
        let start = self.offsets[node] as usize;
        let end = self.offsets[node + 1] as usize;
        &self.targets[start..end]
    }

    /// Iterate over (neighbour, weight) pairs of a node
    pub fn neighbors(&self, node: usize) -> impl Iterator<Item = (u32, f64)> + '_ {
        let start = self.offsets[node] as usize;
        let end = self.offsets[node + 1] as usize;
        (start..end).map(move |slot| (self.targets[slot], self.slot_weight(slot)))
    }

    fn slot_weight(&self, slot: usize) -> f64 {
        self.weights.as_ref().map_or(1.0, |w| w[slot])
    }

    /// Check if there's an edge from src to dst
    pub fn has_edge(&self, src: usize, dst: u32) -> bool {
        self.outgoing_edges(src).binary_search(&dst).is_ok()
    }

    /// Weight of the edge from src to dst, 1.0 for unweighted graphs
    pub fn edge_weight(&self, src: usize, dst: u32) -> Option<f64> {
        let start = self.offsets[src] as usize;
        self.outgoing_edges(src)
            .binary_search(&dst)
            .ok()
            .map(|pos| self.slot_weight(start + pos))
    }

    /// Get out-degree of a node
    pub fn out_degree(&self, node: usize) -> usize {
        let start = self.offsets[node] as usize;
        let end = self.offsets[node + 1] as usize;
        end - start
    }

    /// Weighted degree of a node, ignoring self-loops
    pub fn weighted_degree(&self, node: usize) -> f64 {
        self.neighbors(node)
            .filter(|&(dst, _)| dst as usize != node)
            .map(|(_, w)| w)
            .sum()
    }

    /// External vertex ID of a dense node index
    pub fn external_id(&self, node: usize) -> i64 {
        self.node_ids
            .as_ref()
            .map_or(node as i64, |ids| ids[node])
    }

    /// Total weight of the canonical edge list
    pub fn total_weight(&self) -> f64 {
        self.edge_list.iter().map(Edge::weight).sum()
    }

    /// Estimate memory usage in bytes
    pub fn memory_usage(&self) -> usize {
        let base = mem::size_of::<Self>();
        let offsets = self.offsets.capacity() * mem::size_of::<u32>();
        let targets = self.targets.capacity() * mem::size_of::<u32>();
        let weights = self.weights.as_ref()
            .map(|w| w.capacity() * mem::size_of::<f64>())
            .unwrap_or(0);
        let edges = self.edge_list.capacity() * mem::size_of::<Edge>();
        let ids = self.node_ids.as_ref()
            .map(|ids| ids.capacity() * mem::size_of::<i64>())
            .unwrap_or(0);

        base + offsets + targets + weights + edges + ids
    }
}
