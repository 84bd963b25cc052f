//! Uniformly random cluster assignments used as a quality baseline

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::cluster::ClusterAssignment;
use crate::error::{ClusteringError, Result};

/// Assign every vertex an independent, uniformly drawn cluster id in [0, k).
///
/// No balance constraint is imposed.
pub fn random_assignment<R: Rng>(
    vertex_count: usize,
    k: usize,
    rng: &mut R,
) -> Result<ClusterAssignment> {
    if vertex_count == 0 {
        return Err(ClusteringError::InvalidArgument(
            "cannot assign clusters to an empty vertex set".into(),
        ));
    }
    if k == 0 || k > u32::MAX as usize {
        return Err(ClusteringError::InvalidArgument(format!(
            "cluster count {} is out of range",
            k
        )));
    }

    let upper = k as u32;
    let labels = (0..vertex_count).map(|_| rng.gen_range(0..upper)).collect();
    ClusterAssignment::new(labels, k)
}

/// Random assignment drawn from a `StdRng` seeded with `seed`
pub fn seeded_random_assignment(vertex_count: usize, k: usize, seed: u64) -> Result<ClusterAssignment> {
    let mut rng = StdRng::seed_from_u64(seed);
    random_assignment(vertex_count, k, &mut rng)
}
