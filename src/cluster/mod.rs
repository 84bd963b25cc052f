//! Cluster analysis module

pub mod baseline;
pub mod eigen;
pub mod kmeans;
pub mod metrics;
pub mod spectral;

use serde::{Serialize, Deserialize};

use crate::error::{ClusteringError, Result};
use crate::graph::CompressedGraph;

/// Cluster label of every vertex, with labels in [0, k)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    /// Number of clusters the labels are drawn from
    k: usize,

    /// labels[v] is the cluster of dense vertex v
    labels: Vec<u32>,
}

impl ClusterAssignment {
    /// Create an assignment, checking every label lies in [0, k)
    pub fn new(labels: Vec<u32>, k: usize) -> Result<Self> {
        if k == 0 {
            return Err(ClusteringError::InvalidAssignment(
                "cluster count must be positive".into(),
            ));
        }
        if let Some((vertex, &label)) = labels.iter().enumerate().find(|(_, l)| **l as usize >= k) {
            return Err(ClusteringError::InvalidAssignment(format!(
                "vertex {} has cluster id {} outside [0, {})",
                vertex, label, k
            )));
        }
        Ok(Self { k, labels })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of vertices in each cluster
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.k];
        for &label in &self.labels {
            sizes[label as usize] += 1;
        }
        sizes
    }

    /// Members of each cluster, in vertex order
    pub fn members(&self) -> Vec<Vec<u32>> {
        let mut members = vec![Vec::new(); self.k];
        for (vertex, &label) in self.labels.iter().enumerate() {
            members[label as usize].push(vertex as u32);
        }
        members
    }

    /// Apply a bijection on cluster ids; `mapping[old] = new`
    pub fn relabel(&self, mapping: &[u32]) -> Result<Self> {
        let mut seen = vec![false; self.k];
        for &target in mapping {
            if target as usize >= self.k || std::mem::replace(&mut seen[target as usize], true) {
                return Err(ClusteringError::InvalidArgument(format!(
                    "relabeling {:?} is not a permutation of [0, {})",
                    mapping, self.k
                )));
            }
        }
        if mapping.len() != self.k {
            return Err(ClusteringError::InvalidArgument(format!(
                "relabeling has {} entries, expected {}",
                mapping.len(),
                self.k
            )));
        }
        let labels = self.labels.iter().map(|&l| mapping[l as usize]).collect();
        Ok(Self { k: self.k, labels })
    }

    /// (external vertex ID, cluster) pairs
    pub fn labeled<'a>(&'a self, graph: &'a CompressedGraph) -> impl Iterator<Item = (i64, u32)> + 'a {
        self.labels
            .iter()
            .enumerate()
            .map(move |(vertex, &label)| (graph.external_id(vertex), label))
    }
}

/// Summary of one cluster in a partition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    /// Cluster id in [0, k)
    pub id: u32,

    /// Members of this cluster (node indices)
    pub members: Vec<u32>,

    /// Size of the cluster
    pub size: usize,

    /// Total weight of edges with both endpoints inside
    pub internal_weight: f64,

    /// Total weight of edges leaving the cluster
    pub cut_weight: f64,

    /// Density: internal edges / potential edges
    pub density: f64,

    /// Members with the highest internal weighted degree
    pub central_nodes: Vec<u32>,
}
