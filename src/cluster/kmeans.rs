//! Balanced k-means over a spectral embedding

use ndarray::{Array2, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::error::{ClusteringError, Result};

/// Result of a k-means run
#[derive(Debug, Clone)]
pub struct KMeansOutcome {
    pub labels: Vec<u32>,
    pub centroids: Array2<f64>,
    /// Sum of squared distances of points to their assigned centroid
    pub inertia: f64,
    /// Lloyd iterations used by the winning restart
    pub iterations: usize,
}

/// k-means with k-means++ seeding followed by a capacity-constrained assignment
#[derive(Debug, Clone)]
pub struct BalancedKMeans {
    pub clusters: usize,
    pub max_iter: usize,
    /// Largest centroid movement at which Lloyd iterations stop
    pub tolerance: f64,
    /// Allowed relative excess of a cluster over n / k
    pub balance_tolerance: f64,
    pub restarts: usize,
    pub seed: u64,
}

impl BalancedKMeans {
    /// Largest permitted cluster size for `n` points
    pub fn capacity(&self, n: usize) -> usize {
        let ideal = n as f64 / self.clusters as f64;
        ((1.0 + self.balance_tolerance.max(0.0)) * ideal).ceil().max(1.0) as usize
    }

    /// Cluster the rows of `points`
    pub fn fit(&self, points: ArrayView2<f64>) -> Result<KMeansOutcome> {
        let n = points.nrows();
        if self.clusters == 0 || self.clusters > n {
            return Err(ClusteringError::InvalidArgument(format!(
                "cannot form {} clusters from {} points",
                self.clusters, n
            )));
        }

        let restarts = self.restarts.max(1);
        let outcomes = (0..restarts)
            .into_par_iter()
            .map(|r| self.fit_once(points, self.seed.wrapping_add(r as u64)))
            .collect::<Result<Vec<_>>>()?;

        let best = outcomes
            .into_iter()
            .min_by(|a, b| a.inertia.total_cmp(&b.inertia))
            .ok_or_else(|| ClusteringError::InvalidArgument("no k-means restarts ran".into()))?;

        log::debug!(
            "Balanced k-means: inertia {:.4} after {} iterations ({} restarts)",
            best.inertia,
            best.iterations,
            restarts
        );

        Ok(best)
    }

    fn fit_once(&self, points: ArrayView2<f64>, seed: u64) -> Result<KMeansOutcome> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut centroids = kmeans_plusplus_init(points, self.clusters, &mut rng);
        let mut labels: Option<Vec<u32>> = None;
        let mut shift = f64::INFINITY;

        for iteration in 1..=self.max_iter {
            let assigned = nearest_centroids(points, centroids.view());
            let updated = update_centroids(points, &assigned, &centroids);
            shift = max_centroid_shift(&centroids, &updated);
            centroids = updated;

            let stable = labels.as_ref() == Some(&assigned);
            labels = Some(assigned);
            if stable || shift <= self.tolerance {
                return Ok(self.balance(points, centroids, iteration));
            }
        }

        Err(ClusteringError::Convergence {
            stage: "k-means",
            iterations: self.max_iter,
            residual: shift,
            tolerance: self.tolerance,
        })
    }

    /// Greedy capacity-constrained assignment: closest (point, centroid) pairs first
    fn balance(&self, points: ArrayView2<f64>, centroids: Array2<f64>, iterations: usize) -> KMeansOutcome {
        let n = points.nrows();
        let k = self.clusters;
        let capacity = self.capacity(n);

        let mut pairs: Vec<(f64, usize, usize)> = (0..n)
            .flat_map(|i| {
                let point = points.row(i);
                let centroids = &centroids;
                (0..k).map(move |c| (squared_distance(point, centroids.row(c)), i, c))
            })
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

        let mut labels = vec![u32::MAX; n];
        let mut sizes = vec![0usize; k];
        let mut inertia = 0.0;
        for (distance, i, c) in pairs {
            if labels[i] != u32::MAX || sizes[c] >= capacity {
                continue;
            }
            labels[i] = c as u32;
            sizes[c] += 1;
            inertia += distance;
        }

        let centroids = update_centroids(points, &labels, &centroids);

        KMeansOutcome {
            labels,
            centroids,
            inertia,
            iterations,
        }
    }
}

fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// k-means++: each new centroid is drawn with probability proportional to D^2
fn kmeans_plusplus_init(points: ArrayView2<f64>, k: usize, rng: &mut StdRng) -> Array2<f64> {
    let n = points.nrows();
    let mut chosen = vec![rng.gen_range(0..n)];
    let mut nearest: Vec<f64> = (0..n)
        .map(|i| squared_distance(points.row(i), points.row(chosen[0])))
        .collect();

    while chosen.len() < k {
        let total: f64 = nearest.iter().sum();
        let next = if total > 0.0 {
            let threshold = rng.gen::<f64>() * total;
            let mut cumulative = 0.0;
            nearest
                .iter()
                .position(|&d| {
                    cumulative += d;
                    cumulative > threshold
                })
                .unwrap_or(n - 1)
        } else {
            // All remaining points coincide with a centroid
            rng.gen_range(0..n)
        };
        chosen.push(next);
        for (i, d) in nearest.iter_mut().enumerate() {
            *d = d.min(squared_distance(points.row(i), points.row(next)));
        }
    }

    Array2::from_shape_fn((k, points.ncols()), |(c, j)| points[[chosen[c], j]])
}

/// Label of the closest centroid for every point (ties go to the lower id)
fn nearest_centroids(points: ArrayView2<f64>, centroids: ArrayView2<f64>) -> Vec<u32> {
    (0..points.nrows())
        .map(|i| {
            let point = points.row(i);
            let mut best = (0, f64::INFINITY);
            for (c, centroid) in centroids.outer_iter().enumerate() {
                let d = squared_distance(point, centroid);
                if d < best.1 {
                    best = (c, d);
                }
            }
            best.0 as u32
        })
        .collect()
}

/// Mean of each cluster; empty clusters keep their previous centroid
fn update_centroids(points: ArrayView2<f64>, labels: &[u32], previous: &Array2<f64>) -> Array2<f64> {
    let mut sums = Array2::<f64>::zeros(previous.raw_dim());
    let mut counts = vec![0usize; previous.nrows()];
    for (point, &label) in points.outer_iter().zip(labels) {
        let label = label as usize;
        let mut row = sums.row_mut(label);
        row += &point;
        counts[label] += 1;
    }

    for (c, count) in counts.into_iter().enumerate() {
        if count == 0 {
            sums.row_mut(c).assign(&previous.row(c));
        } else {
            sums.row_mut(c).mapv_inplace(|x| x / count as f64);
        }
    }
    sums
}

fn max_centroid_shift(old: &Array2<f64>, new: &Array2<f64>) -> f64 {
    old.outer_iter()
        .zip(new.outer_iter())
        .map(|(a, b)| squared_distance(a, b).sqrt())
        .fold(0.0, f64::max)
}
