//! Spectral clustering versus random assignment, scored by edge-cut

use serde::{Serialize, Deserialize};

use crate::cluster::baseline::seeded_random_assignment;
use crate::cluster::metrics::edge_cut;
use crate::cluster::spectral::spectral_balanced_cut_clustering;
use crate::cluster::ClusterAssignment;
use crate::config::ClusteringConfig;
use crate::error::Result;
use crate::graph::Graph;

/// Scores of one evaluation run; lower edge-cut is better
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub partitions: usize,
    pub seed: u64,
    pub clusterer_score: f64,
    pub baseline_score: f64,
    pub assignment: ClusterAssignment,
    pub baseline: ClusterAssignment,
}

impl EvaluationReport {
    /// Whether spectral clustering cut strictly less weight than the baseline
    pub fn clusterer_wins(&self) -> bool {
        self.clusterer_score < self.baseline_score
    }
}

/// Cluster `graph` into `partitions` parts and score the result against a
/// random assignment drawn with `seed`.
///
/// Both scores are returned as-is; comparing them is up to the caller.
pub fn evaluate(
    graph: &Graph,
    partitions: usize,
    seed: u64,
    config: &ClusteringConfig,
) -> Result<EvaluationReport> {
    let assignment = spectral_balanced_cut_clustering(graph, partitions, config)?;
    let clusterer_score = edge_cut(graph, partitions, assignment.labels())?;

    let baseline = seeded_random_assignment(graph.vertex_count(), partitions, seed)?;
    let baseline_score = edge_cut(graph, partitions, baseline.labels())?;

    log::info!(
        "k={}: spectral edge cut {} vs random edge cut {}",
        partitions,
        clusterer_score,
        baseline_score
    );

    Ok(EvaluationReport {
        partitions,
        seed,
        clusterer_score,
        baseline_score,
        assignment,
        baseline,
    })
}
