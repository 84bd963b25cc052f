//! Graph Laplacian operators for spectral embedding

use std::cmp::Reverse;

use ndarray::{Array2, ArrayView2};
use petgraph::unionfind::UnionFind;
use rayon::prelude::*;
use serde::{Serialize, Deserialize};

use crate::graph::CompressedGraph;

/// Below this many rows the operator is applied sequentially
const PARALLEL_ROW_THRESHOLD: usize = 1000;

/// Which Laplacian the spectral embedding is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaplacianKind {
    /// L = I - D^-1/2 A D^-1/2
    #[default]
    Normalized,
    /// L = D - A
    Unnormalized,
}

/// Matrix-free Laplacian of an undirected graph.
///
/// Self-loops are ignored. Isolated vertices get an all-zero row in the
/// normalized Laplacian. The shifted operator `shift * I - L` has the same
/// eigenvectors as `L` with the order of the spectrum reversed, so its
/// dominant eigenvectors are the smallest ones of `L`.
pub struct LaplacianOperator<'a> {
    graph: &'a CompressedGraph,
    kind: LaplacianKind,
    degrees: Vec<f64>,
    inv_sqrt_degrees: Vec<f64>,
    shift: f64,
}

impl<'a> LaplacianOperator<'a> {
    pub fn new(graph: &'a CompressedGraph, kind: LaplacianKind) -> Self {
        let degrees: Vec<f64> = (0..graph.vertex_count())
            .map(|v| graph.weighted_degree(v))
            .collect();
        let inv_sqrt_degrees = degrees
            .iter()
            .map(|&d| if d > 0.0 { 1.0 / d.sqrt() } else { 0.0 })
            .collect();

        // Upper bound on the spectrum: 2 for normalized, 2 * max degree (Gershgorin) otherwise
        let shift = match kind {
            LaplacianKind::Normalized => 2.0,
            LaplacianKind::Unnormalized => {
                let max_degree = degrees.iter().copied().fold(0.0, f64::max);
                if max_degree > 0.0 { 2.0 * max_degree } else { 1.0 }
            }
        };

        Self {
            graph,
            kind,
            degrees,
            inv_sqrt_degrees,
            shift,
        }
    }

    pub fn dimension(&self) -> usize {
        self.degrees.len()
    }

    pub fn kind(&self) -> LaplacianKind {
        self.kind
    }

    pub fn shift(&self) -> f64 {
        self.shift
    }

    pub fn degrees(&self) -> &[f64] {
        &self.degrees
    }

    /// D^-1/2 diagonal, 0 for isolated vertices
    pub fn inv_sqrt_degrees(&self) -> &[f64] {
        &self.inv_sqrt_degrees
    }

    /// Off-diagonal coefficient for an edge (i, j) with weight w
    fn coupling(&self, i: usize, j: usize, w: f64) -> f64 {
        match self.kind {
            LaplacianKind::Unnormalized => w,
            LaplacianKind::Normalized => self.inv_sqrt_degrees[i] * w * self.inv_sqrt_degrees[j],
        }
    }

    fn diagonal(&self, i: usize) -> f64 {
        match self.kind {
            LaplacianKind::Unnormalized => self.degrees[i],
            LaplacianKind::Normalized => if self.degrees[i] > 0.0 { 1.0 } else { 0.0 },
        }
    }

    /// Row i of L X
    fn laplacian_row(&self, i: usize, x: ArrayView2<f64>) -> Vec<f64> {
        let diagonal = self.diagonal(i);
        let mut out: Vec<f64> = x.row(i).iter().map(|&v| diagonal * v).collect();

        for (j, w) in self.graph.neighbors(i) {
            let j = j as usize;
            if j == i {
                continue;
            }
            let coupling = self.coupling(i, j, w);
            for (o, &xj) in out.iter_mut().zip(x.row(j).iter()) {
                *o -= coupling * xj;
            }
        }

        out
    }

    /// Compute L X for a block of column vectors
    pub fn apply(&self, x: ArrayView2<f64>) -> Array2<f64> {
        self.apply_rows(x, false)
    }

    /// Compute (shift * I - L) X for a block of column vectors
    pub fn apply_shifted(&self, x: ArrayView2<f64>) -> Array2<f64> {
        self.apply_rows(x, true)
    }

    fn apply_rows(&self, x: ArrayView2<f64>, shifted: bool) -> Array2<f64> {
        let n = self.dimension();
        let cols = x.ncols();

        let row = |i: usize| {
            let mut values = self.laplacian_row(i, x);
            if shifted {
                for (v, &xi) in values.iter_mut().zip(x.row(i).iter()) {
                    *v = self.shift * xi - *v;
                }
            }
            values
        };

        // For small graphs, use sequential processing
        let rows: Vec<Vec<f64>> = if n < PARALLEL_ROW_THRESHOLD {
            (0..n).map(row).collect()
        } else {
            (0..n).into_par_iter().map(row).collect()
        };

        Array2::from_shape_fn((n, cols), |(i, c)| rows[i][c])
    }

    /// Orthonormal basis of the kernel of L, one column per component.
    ///
    /// Only edges of positive weight connect vertices, so every component
    /// with more than one vertex has positive volume. Columns are ordered
    /// by component size, largest first, ties going to the component with
    /// the lower vertex.
    pub fn kernel_basis(&self) -> Array2<f64> {
        let n = self.dimension();
        let mut sets = UnionFind::<usize>::new(n);
        for edge in self.graph.edges() {
            if !edge.is_self_loop() && edge.weight() > 0.0 {
                sets.union(edge.src as usize, edge.dst as usize);
            }
        }
        let roots = sets.into_labeling();

        let mut slot_of_root = vec![usize::MAX; n];
        let mut components: Vec<Vec<usize>> = Vec::new();
        for (v, &root) in roots.iter().enumerate() {
            if slot_of_root[root] == usize::MAX {
                slot_of_root[root] = components.len();
                components.push(Vec::new());
            }
            components[slot_of_root[root]].push(v);
        }
        components.sort_by_key(|members| Reverse(members.len()));

        let mut basis = Array2::zeros((n, components.len()));
        for (c, members) in components.iter().enumerate() {
            let entry = |v: usize| match self.kind {
                LaplacianKind::Normalized if self.degrees[v] > 0.0 => self.degrees[v].sqrt(),
                _ => 1.0,
            };
            let norm = members.iter().map(|&v| entry(v).powi(2)).sum::<f64>().sqrt();
            for &v in members {
                basis[[v, c]] = entry(v) / norm;
            }
        }

        basis
    }

    /// Materialize L as a dense matrix
    pub fn dense(&self) -> Array2<f64> {
        let n = self.dimension();
        let mut dense = Array2::zeros((n, n));

        for i in 0..n {
            dense[[i, i]] = self.diagonal(i);
            for (j, w) in self.graph.neighbors(i) {
                let j = j as usize;
                if j != i {
                    dense[[i, j]] -= self.coupling(i, j, w);
                }
            }
        }

        dense
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};

    fn path_graph() -> crate::graph::Graph {
        let mut builder = GraphBuilder::undirected();
        builder.add_edge(0, 1);
        builder.add_edge(1, 2);
        builder.build().unwrap()
    }

    #[test]
    fn unnormalized_dense_matches_d_minus_a() {
        let graph = path_graph();
        let op = LaplacianOperator::new(&graph, LaplacianKind::Unnormalized);
        let expected = array![[1.0, -1.0, 0.0], [-1.0, 2.0, -1.0], [0.0, -1.0, 1.0]];
        assert_eq!(op.dense(), expected);
        assert_eq!(op.shift(), 4.0);
    }

    #[test]
    fn constant_vector_is_in_unnormalized_kernel() {
        let graph = path_graph();
        let op = LaplacianOperator::new(&graph, LaplacianKind::Unnormalized);
        let ones = Array2::from_elem((3, 1), 1.0);
        for v in op.apply(ones.view()).iter() {
            assert_abs_diff_eq!(*v, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn sqrt_degree_vector_is_in_normalized_kernel() {
        let graph = path_graph();
        let op = LaplacianOperator::new(&graph, LaplacianKind::Normalized);
        let x = Array2::from_shape_fn((3, 1), |(i, _)| op.degrees()[i].sqrt());
        for v in op.apply(x.view()).iter() {
            assert_abs_diff_eq!(*v, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn apply_agrees_with_dense_and_shift() {
        let graph = path_graph();
        let op = LaplacianOperator::new(&graph, LaplacianKind::Normalized);
        let x = array![[1.0, 0.5], [-2.0, 0.25], [3.0, -1.0]];

        let dense = op.dense().dot(&x);
        let applied = op.apply(x.view());
        let shifted = op.apply_shifted(x.view());
        for ((d, a), (s, xv)) in dense.iter().zip(applied.iter()).zip(shifted.iter().zip(x.iter())) {
            assert_abs_diff_eq!(*d, *a, epsilon = 1e-12);
            assert_abs_diff_eq!(*s, 2.0 * xv - a, epsilon = 1e-12);
        }
    }

    #[test]
    fn kernel_basis_spans_components() {
        // A triangle, an edge and an isolated vertex
        let mut builder = GraphBuilder::undirected().renumber(false).with_vertex_count(6);
        builder.add_edge(0, 1);
        builder.add_edge(1, 2);
        builder.add_edge(0, 2);
        builder.add_edge(3, 4);
        let graph = builder.build().unwrap();

        for kind in [LaplacianKind::Normalized, LaplacianKind::Unnormalized] {
            let op = LaplacianOperator::new(&graph, kind);
            let kernel = op.kernel_basis();
            assert_eq!(kernel.ncols(), 3);

            // Largest component first, isolated vertex last
            assert!(kernel.column(0).iter().take(3).all(|&v| v > 0.0));
            assert_eq!(kernel[[5, 2]], 1.0);

            let gram = kernel.t().dot(&kernel);
            for ((r, c), &g) in gram.indexed_iter() {
                assert_abs_diff_eq!(g, if r == c { 1.0 } else { 0.0 }, epsilon = 1e-12);
            }
            for v in op.apply(kernel.view()).iter() {
                assert_abs_diff_eq!(*v, 0.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn zero_weight_edges_do_not_join_components() {
        let mut builder = GraphBuilder::undirected();
        builder.add_weighted_edge(0, 1, 1.0);
        builder.add_weighted_edge(1, 2, 0.0);
        let graph = builder.build().unwrap();
        let op = LaplacianOperator::new(&graph, LaplacianKind::Normalized);
        assert_eq!(op.kernel_basis().ncols(), 2);
    }

    #[test]
    fn isolated_vertex_has_zero_row() {
        let mut builder = GraphBuilder::undirected().renumber(false).with_vertex_count(3);
        builder.add_edge(0, 1);
        let graph = builder.build().unwrap();
        let op = LaplacianOperator::new(&graph, LaplacianKind::Normalized);
        let dense = op.dense();
        assert!(dense.row(2).iter().all(|&v| v == 0.0));
        assert_eq!(dense[[0, 0]], 1.0);
    }
}
