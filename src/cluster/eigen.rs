//! Symmetric eigensolvers for the spectral embedding
//!
//! Small Laplacians are diagonalized densely. Larger ones take their kernel
//! straight from the component structure and find the remaining eigenpairs
//! with Chebyshev-filtered subspace iteration: each pass amplifies the part
//! of the spectrum below the largest Ritz value of the block and damps the
//! rest, followed by a Rayleigh-Ritz projection.

use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{s, Array2, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{ClusteringError, Result};
use crate::graph::laplacian::LaplacianOperator;

/// QR sweeps allowed per matrix row before the dense solver gives up
const DENSE_SWEEPS_PER_ROW: usize = 100;

/// Polynomial degree of one filter pass
const CHEBYSHEV_DEGREE: usize = 10;

/// The damped interval never starts above this fraction of the spectral bound
const MAX_FILTER_CUTOFF: f64 = 0.99;

/// A column that loses this fraction of its norm to projection is redrawn
const ORTHOGONALITY_LOSS: f64 = 1e-8;

/// Eigenvalues in ascending order with matching eigenvector columns
#[derive(Debug, Clone)]
pub struct EigenPairs {
    pub values: Vec<f64>,
    pub vectors: Array2<f64>,
    /// Filter passes of the iterative solver, 0 for the dense path
    pub iterations: usize,
}

/// Knobs for `smallest_eigenpairs`
#[derive(Debug, Clone)]
pub struct EigenSolverOptions {
    /// Largest Ritz residual, relative to the spectral bound, accepted by the iterative solver
    pub tolerance: f64,
    /// Filter passes allowed to the iterative solver
    pub max_iter: usize,
    /// Graphs with at most this many vertices are solved densely
    pub dense_threshold: usize,
    /// Seed of the random starting block
    pub seed: u64,
}

/// Full eigendecomposition of a symmetric matrix, eigenvalues ascending
pub fn symmetric_eigen(matrix: &Array2<f64>) -> Result<EigenPairs> {
    let n = matrix.nrows();
    if matrix.ncols() != n {
        return Err(ClusteringError::InvalidArgument(format!(
            "eigendecomposition needs a square matrix, got {}x{}",
            n,
            matrix.ncols()
        )));
    }

    let max_sweeps = DENSE_SWEEPS_PER_ROW * n.max(1);
    let dense = DMatrix::from_fn(n, n, |r, c| matrix[[r, c]]);
    let eigen = SymmetricEigen::try_new(dense, f64::EPSILON, max_sweeps).ok_or(
        ClusteringError::Convergence {
            stage: "dense eigensolver",
            iterations: max_sweeps,
            residual: f64::INFINITY,
            tolerance: f64::EPSILON,
        },
    )?;

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| eigen.eigenvalues[i].total_cmp(&eigen.eigenvalues[j]));

    Ok(EigenPairs {
        values: order.iter().map(|&i| eigen.eigenvalues[i]).collect(),
        vectors: Array2::from_shape_fn((n, n), |(r, c)| eigen.eigenvectors[(r, order[c])]),
        iterations: 0,
    })
}

/// The `count` smallest eigenpairs of a graph Laplacian
pub fn smallest_eigenpairs(
    op: &LaplacianOperator<'_>,
    count: usize,
    options: &EigenSolverOptions,
) -> Result<EigenPairs> {
    let n = op.dimension();
    if count == 0 || count > n {
        return Err(ClusteringError::InvalidArgument(format!(
            "cannot compute {} eigenvectors of a {}-vertex Laplacian",
            count, n
        )));
    }

    if n <= options.dense_threshold {
        log::debug!("Dense eigendecomposition of {}x{} Laplacian", n, n);
        let full = symmetric_eigen(&op.dense())?;
        return Ok(EigenPairs {
            values: full.values[..count].to_vec(),
            vectors: full.vectors.slice(s![.., ..count]).to_owned(),
            iterations: full.iterations,
        });
    }

    let kernel = op.kernel_basis();
    let components = kernel.ncols();
    if components >= count {
        log::debug!(
            "Kernel of dimension {} covers all {} eigenvectors",
            components,
            count
        );
        return Ok(EigenPairs {
            values: vec![0.0; count],
            vectors: kernel.slice(s![.., ..count]).to_owned(),
            iterations: 0,
        });
    }

    let rest = filtered_subspace_iteration(op, kernel.view(), count - components, options)?;

    let mut values = vec![0.0; components];
    values.extend_from_slice(&rest.values);
    let vectors = Array2::from_shape_fn((n, count), |(r, c)| {
        if c < components {
            kernel[[r, c]]
        } else {
            rest.vectors[[r, c - components]]
        }
    });

    Ok(EigenPairs {
        values,
        vectors,
        iterations: rest.iterations,
    })
}

/// Smallest `count` eigenpairs of L restricted to the complement of `locked`
fn filtered_subspace_iteration(
    op: &LaplacianOperator<'_>,
    locked: ArrayView2<f64>,
    count: usize,
    options: &EigenSolverOptions,
) -> Result<EigenPairs> {
    let n = op.dimension();
    let free = n - locked.ncols();
    let block = (2 * count).max(count + 4).min(free);
    let bound = op.shift();

    log::debug!(
        "Filtered subspace iteration for {} eigenvectors with block size {} (n={}, {} locked)",
        count,
        block,
        n,
        locked.ncols()
    );

    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut basis = Array2::from_shape_simple_fn((n, block), || rng.gen_range(-1.0..1.0));
    orthonormalize(&mut basis, locked, &mut rng);
    let mut residual = f64::INFINITY;

    for iteration in 1..=options.max_iter {
        let image = op.apply(basis.view());
        let projected = basis.t().dot(&image);
        let projected = (&projected + &projected.t()) * 0.5;
        let ritz = symmetric_eigen(&projected)?;

        let vectors = basis.dot(&ritz.vectors);
        let images = image.dot(&ritz.vectors);

        residual = (0..count)
            .map(|c| {
                let r = &images.column(c) - &(&vectors.column(c) * ritz.values[c]);
                r.dot(&r).sqrt()
            })
            .fold(0.0, f64::max)
            / bound;

        if iteration % 100 == 0 {
            log::debug!("Iteration {}: max relative residual {:.3e}", iteration, residual);
        }

        if residual <= options.tolerance {
            log::debug!("Eigensolver converged after {} iterations", iteration);
            return Ok(EigenPairs {
                values: ritz.values[..count].to_vec(),
                vectors: vectors.slice(s![.., ..count]).to_owned(),
                iterations: iteration,
            });
        }

        // Everything above the largest Ritz value is treated as unwanted
        let cutoff = ritz.values[block - 1].clamp(0.0, MAX_FILTER_CUTOFF * bound);
        basis = chebyshev_filter(op, vectors, cutoff, bound);
        orthonormalize(&mut basis, locked, &mut rng);
    }

    Err(ClusteringError::Convergence {
        stage: "subspace eigensolver",
        iterations: options.max_iter,
        residual,
        tolerance: options.tolerance,
    })
}

/// T_m((L - c I) / e) X, where [cutoff, bound] maps onto [-1, 1]
fn chebyshev_filter(op: &LaplacianOperator<'_>, x: Array2<f64>, cutoff: f64, bound: f64) -> Array2<f64> {
    let half_width = (bound - cutoff) / 2.0;
    let center = (bound + cutoff) / 2.0;

    let mut previous = x;
    let mut current = (op.apply(previous.view()) - &previous * center) / half_width;
    for _ in 1..CHEBYSHEV_DEGREE {
        let next = (op.apply(current.view()) - &current * center) * (2.0 / half_width) - &previous;
        previous = current;
        current = next;
    }
    current
}

/// Modified Gram-Schmidt against `locked` and the earlier columns, run twice;
/// collapsed columns are redrawn
fn orthonormalize(basis: &mut Array2<f64>, locked: ArrayView2<f64>, rng: &mut StdRng) {
    for j in 0..basis.ncols() {
        loop {
            let before = basis.column(j).dot(&basis.column(j)).sqrt();
            for _ in 0..2 {
                for fixed in locked.columns() {
                    let proj = fixed.dot(&basis.column(j));
                    basis.column_mut(j).scaled_add(-proj, &fixed);
                }
                for i in 0..j {
                    let prev = basis.column(i).to_owned();
                    let proj = prev.dot(&basis.column(j));
                    basis.column_mut(j).scaled_add(-proj, &prev);
                }
            }

            let norm = basis.column(j).dot(&basis.column(j)).sqrt();
            if norm > ORTHOGONALITY_LOSS * before && norm > 0.0 {
                basis.column_mut(j).mapv_inplace(|x| x / norm);
                break;
            }
            basis.column_mut(j).mapv_inplace(|_| rng.gen_range(-1.0..1.0));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::laplacian::LaplacianKind;
    use crate::graph::{Graph, GraphBuilder};
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use std::f64::consts::PI;

    /// Six 5-cliques joined in a ring by single edges
    fn ring_of_cliques() -> Graph {
        let (cliques, size) = (6, 5);
        let mut builder = GraphBuilder::undirected();
        for c in 0..cliques {
            let base = (c * size) as i64;
            for i in 0..size as i64 {
                for j in (i + 1)..size as i64 {
                    builder.add_edge(base + i, base + j);
                }
            }
            let next = (((c + 1) % cliques) * size) as i64;
            builder.add_edge(base, next + 1);
        }
        builder.build().unwrap()
    }

    fn cycle(n: i64) -> Graph {
        let mut builder = GraphBuilder::undirected();
        for v in 0..n {
            builder.add_edge(v, (v + 1) % n);
        }
        builder.build().unwrap()
    }

    fn options(dense_threshold: usize) -> EigenSolverOptions {
        EigenSolverOptions {
            tolerance: 1e-9,
            max_iter: 5000,
            dense_threshold,
            seed: 0,
        }
    }

    fn default_options() -> EigenSolverOptions {
        EigenSolverOptions {
            tolerance: 1e-5,
            max_iter: 4000,
            dense_threshold: 200,
            seed: 0,
        }
    }

    /// Largest |L v - lambda v| over the returned pairs
    fn max_residual(op: &LaplacianOperator<'_>, pairs: &EigenPairs) -> f64 {
        let image = op.apply(pairs.vectors.view());
        (0..pairs.values.len())
            .map(|c| {
                let r = &image.column(c) - &(&pairs.vectors.column(c) * pairs.values[c]);
                r.dot(&r).sqrt()
            })
            .fold(0.0, f64::max)
    }

    #[test]
    fn dense_two_by_two() {
        let pairs = symmetric_eigen(&array![[2.0, 1.0], [1.0, 2.0]]).unwrap();
        assert_abs_diff_eq!(pairs.values[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(pairs.values[1], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn dense_vectors_are_orthonormal_eigenvectors() {
        let m = array![[4.0, 1.0, 0.5], [1.0, 3.0, 1.0], [0.5, 1.0, 2.0]];
        let pairs = symmetric_eigen(&m).unwrap();

        let gram = pairs.vectors.t().dot(&pairs.vectors);
        for ((r, c), &g) in gram.indexed_iter() {
            assert_abs_diff_eq!(g, if r == c { 1.0 } else { 0.0 }, epsilon = 1e-10);
        }
        for c in 0..3 {
            let v = pairs.vectors.column(c);
            let mv = m.dot(&v);
            for (a, b) in mv.iter().zip(v.iter()) {
                assert_abs_diff_eq!(*a, pairs.values[c] * b, epsilon = 1e-10);
            }
        }
        assert!(pairs.values.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn rejects_non_square_matrix() {
        let m = Array2::<f64>::zeros((2, 3));
        assert!(matches!(symmetric_eigen(&m), Err(ClusteringError::InvalidArgument(_))));
    }

    #[test]
    fn iterative_matches_dense_on_gapped_spectrum() {
        let graph = ring_of_cliques();
        let op = LaplacianOperator::new(&graph, LaplacianKind::Normalized);

        let dense = smallest_eigenpairs(&op, 3, &options(usize::MAX)).unwrap();
        let iterative = smallest_eigenpairs(&op, 3, &options(0)).unwrap();

        assert_abs_diff_eq!(dense.values[0], 0.0, epsilon = 1e-9);
        for (d, i) in dense.values.iter().zip(iterative.values.iter()) {
            assert_abs_diff_eq!(*d, *i, epsilon = 1e-6);
        }
        assert!(max_residual(&op, &iterative) < 1e-6);
    }

    #[test]
    fn unnormalized_iterative_matches_dense() {
        let graph = ring_of_cliques();
        let op = LaplacianOperator::new(&graph, LaplacianKind::Unnormalized);

        let dense = smallest_eigenpairs(&op, 2, &options(usize::MAX)).unwrap();
        let iterative = smallest_eigenpairs(&op, 2, &options(0)).unwrap();
        for (d, i) in dense.values.iter().zip(iterative.values.iter()) {
            assert_abs_diff_eq!(*d, *i, epsilon = 1e-5);
        }
    }

    #[test]
    fn long_cycle_converges_within_default_budget() {
        let n = 1000;
        let graph = cycle(n);
        let op = LaplacianOperator::new(&graph, LaplacianKind::Normalized);

        for count in [2, 4, 8] {
            let pairs = smallest_eigenpairs(&op, count, &default_options()).unwrap();
            assert_eq!(pairs.values.len(), count);
            assert_eq!(pairs.values[0], 0.0);

            // Spectrum of the cycle: 1 - cos(2 pi j / n), each j > 0 twice
            for (i, &value) in pairs.values.iter().enumerate() {
                let j = (i + 1) / 2;
                let expected = 1.0 - (2.0 * PI * j as f64 / n as f64).cos();
                assert_abs_diff_eq!(value, expected, epsilon = 1e-5);
            }
            assert!(max_residual(&op, &pairs) <= 2.0 * 1e-5 * 1.01);
        }
    }

    #[test]
    fn many_components_fill_the_kernel() {
        // 100 disjoint triangles
        let mut builder = GraphBuilder::undirected();
        for t in 0..100i64 {
            builder.add_edge(3 * t, 3 * t + 1);
            builder.add_edge(3 * t + 1, 3 * t + 2);
            builder.add_edge(3 * t, 3 * t + 2);
        }
        let graph = builder.build().unwrap();
        let op = LaplacianOperator::new(&graph, LaplacianKind::Normalized);

        let pairs = smallest_eigenpairs(&op, 8, &default_options()).unwrap();
        assert_eq!(pairs.values, vec![0.0; 8]);
        assert_eq!(pairs.iterations, 0);
        assert!(max_residual(&op, &pairs) < 1e-12);
    }

    #[test]
    fn kernel_is_locked_when_components_are_few() {
        // Two disjoint 150-cycles
        let mut builder = GraphBuilder::undirected();
        for base in [0i64, 150] {
            for v in 0..150 {
                builder.add_edge(base + v, base + (v + 1) % 150);
            }
        }
        let graph = builder.build().unwrap();
        let op = LaplacianOperator::new(&graph, LaplacianKind::Normalized);

        let pairs = smallest_eigenpairs(&op, 4, &default_options()).unwrap();
        assert_eq!(&pairs.values[..2], &[0.0, 0.0]);
        let expected = 1.0 - (2.0 * PI / 150.0).cos();
        assert_abs_diff_eq!(pairs.values[2], expected, epsilon = 1e-5);
        assert_abs_diff_eq!(pairs.values[3], expected, epsilon = 1e-5);

        let gram = pairs.vectors.t().dot(&pairs.vectors);
        for ((r, c), &g) in gram.indexed_iter() {
            assert_abs_diff_eq!(g, if r == c { 1.0 } else { 0.0 }, epsilon = 1e-8);
        }
    }

    #[test]
    fn exhausted_budget_is_a_convergence_error() {
        let graph = ring_of_cliques();
        let op = LaplacianOperator::new(&graph, LaplacianKind::Normalized);
        let tight = EigenSolverOptions {
            tolerance: 1e-15,
            max_iter: 1,
            dense_threshold: 0,
            seed: 0,
        };
        let err = smallest_eigenpairs(&op, 2, &tight).unwrap_err();
        assert!(matches!(err, ClusteringError::Convergence { iterations: 1, .. }));
    }

    #[test]
    fn rejects_too_many_eigenvectors() {
        let graph = ring_of_cliques();
        let op = LaplacianOperator::new(&graph, LaplacianKind::Normalized);
        assert!(matches!(
            smallest_eigenpairs(&op, 31, &options(0)),
            Err(ClusteringError::InvalidArgument(_))
        ));
    }
}
