//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::path::PathBuf;

use balanced_cut_analyzer::data::{graph_from_dataframe, read_edge_list, EdgeListOptions};
use balanced_cut_analyzer::{ContextOptions, Graph, GraphBuilder};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Dedicated pools of one and two threads, plus the global pool
pub const CONTEXTS: [ContextOptions; 3] = [
    ContextOptions { pooled: false, threads: 0 },
    ContextOptions { pooled: true, threads: 1 },
    ContextOptions { pooled: true, threads: 2 },
];

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// An edge-list fixture under `tests/data/`
#[derive(Debug, Clone, Copy)]
pub struct Dataset {
    pub file: &'static str,
    pub vertices: usize,
    pub edges: usize,
}

/// Zachary's karate club, with a synthetic weight column
pub const KARATE: Dataset = Dataset { file: "karate.csv", vertices: 34, edges: 78 };

/// Les Miserables co-appearance network, weighted by shared chapters
pub const LES_MISERABLES: Dataset = Dataset { file: "lesmis.csv", vertices: 77, edges: 254 };

/// A 400-cycle plus every connected 3- to 6-vertex graph of the graph
/// atlas as its own component: 142 components, one of diameter 200
pub const COMPONENTS: Dataset = Dataset { file: "components.csv", vertices: 1207, edges: 1511 };

pub const DATASETS: [Dataset; 3] = [KARATE, LES_MISERABLES, COMPONENTS];

pub fn load(dataset: Dataset, weighted: bool) -> Graph {
    let df = read_edge_list(fixture(dataset.file), &EdgeListOptions::default()).unwrap();
    let weight = if weighted { Some("2") } else { None };
    graph_from_dataframe(&df, GraphBuilder::undirected(), "0", "1", weight).unwrap()
}

pub fn karate(weighted: bool) -> Graph {
    load(KARATE, weighted)
}

/// Unweighted cycle on `n` vertices
pub fn cycle(n: usize) -> Graph {
    let mut builder = GraphBuilder::undirected();
    for v in 0..n as i64 {
        builder.add_edge(v, (v + 1) % n as i64);
    }
    builder.build().unwrap()
}

/// Stochastic block model with `blocks` equal blocks of `block_size` vertices.
///
/// Vertex v belongs to block v / block_size.
pub fn planted_partition(blocks: usize, block_size: usize, p_in: f64, p_out: f64, seed: u64) -> Graph {
    let n = blocks * block_size;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut builder = GraphBuilder::undirected()
        .renumber(false)
        .with_vertex_count(n);

    for u in 0..n {
        for v in (u + 1)..n {
            let p = if u / block_size == v / block_size { p_in } else { p_out };
            if rng.gen_bool(p) {
                builder.add_edge(u as i64, v as i64);
            }
        }
    }

    builder.build().unwrap()
}

pub fn planted_labels(blocks: usize, block_size: usize) -> Vec<u32> {
    (0..blocks * block_size).map(|v| (v / block_size) as u32).collect()
}
