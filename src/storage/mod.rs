//! Results persistence module

use anyhow::Result;
use crate::cluster::metrics::{modularity, ratio_cut, summarize_clusters};
use crate::config::ClusteringConfig;
use crate::evaluate::EvaluationReport;
use crate::graph::algorithms::connected_components;
use crate::graph::Graph;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use serde_json::{json, to_string_pretty};

/// Save evaluation results to the specified directory
pub fn save_results(
    reports: &[EvaluationReport],
    graph: &Graph,
    config: &ClusteringConfig,
    output_dir: &str,
) -> Result<()> {
    log::info!("Saving {} evaluation runs to {}", reports.len(), output_dir);

    // Ensure output directory exists
    fs::create_dir_all(output_dir)?;

    save_summary(reports, graph, config, output_dir)?;
    save_assignments(reports, graph, output_dir)?;
    save_clusters(reports, graph, output_dir)?;

    log::info!("Results saved successfully");

    Ok(())
}

/// Save graph statistics and per-partition scores
fn save_summary(
    reports: &[EvaluationReport],
    graph: &Graph,
    config: &ClusteringConfig,
    output_dir: &str,
) -> Result<()> {
    log::info!("Saving summary information");

    let path = Path::new(output_dir).join("summary.json");
    let mut file = File::create(path)?;

    let mut runs = Vec::with_capacity(reports.len());
    for report in reports {
        let k = report.partitions;
        runs.push(json!({
            "partitions": k,
            "seed": report.seed,
            "clusterer": {
                "edge_cut": report.clusterer_score,
                "ratio_cut": ratio_cut(graph, k, report.assignment.labels())?,
                "modularity": modularity(graph, k, report.assignment.labels())?,
                "cluster_sizes": report.assignment.cluster_sizes(),
            },
            "baseline": {
                "edge_cut": report.baseline_score,
                "ratio_cut": ratio_cut(graph, k, report.baseline.labels())?,
                "modularity": modularity(graph, k, report.baseline.labels())?,
                "cluster_sizes": report.baseline.cluster_sizes(),
            },
            "clusterer_wins": report.clusterer_wins(),
        }));
    }

    let vertices = graph.vertex_count();
    let summary = json!({
        "graph_stats": {
            "kind": graph.kind(),
            "weighted": graph.is_weighted(),
            "node_count": vertices,
            "edge_count": graph.edge_count(),
            "total_weight": graph.total_weight(),
            "avg_degree": if vertices == 0 { 0.0 } else { 2.0 * graph.edge_count() as f64 / vertices as f64 },
            "connected_components": connected_components(graph),
            "memory_bytes": graph.memory_usage(),
        },
        "config": config,
        "runs": runs,
    });

    file.write_all(to_string_pretty(&summary)?.as_bytes())?;

    Ok(())
}

/// Save the external id -> cluster mapping of each run
fn save_assignments(reports: &[EvaluationReport], graph: &Graph, output_dir: &str) -> Result<()> {
    log::info!("Saving cluster assignments");

    let dir = Path::new(output_dir).join("assignments");
    fs::create_dir_all(&dir)?;

    for report in reports {
        let path = dir.join(format!("partition_{}.json", report.partitions));
        let mut file = File::create(path)?;

        let rows: Vec<_> = report
            .assignment
            .labeled(graph)
            .map(|(vertex, cluster)| json!({ "vertex": vertex, "cluster": cluster }))
            .collect();

        file.write_all(to_string_pretty(&rows)?.as_bytes())?;
    }

    Ok(())
}

/// Save per-cluster statistics of each run
fn save_clusters(reports: &[EvaluationReport], graph: &Graph, output_dir: &str) -> Result<()> {
    log::info!("Saving individual cluster information");

    let dir = Path::new(output_dir).join("clusters");
    fs::create_dir_all(&dir)?;

    for report in reports {
        let clusters = summarize_clusters(graph, &report.assignment)?;

        // Resolve dense indices back to the ids found in the input
        let clusters_json: Vec<_> = clusters
            .iter()
            .map(|c| {
                json!({
                    "id": c.id,
                    "size": c.size,
                    "density": c.density,
                    "internal_weight": c.internal_weight,
                    "cut_weight": c.cut_weight,
                    "central_nodes": c.central_nodes.iter().map(|&v| graph.external_id(v as usize)).collect::<Vec<_>>(),
                    "members": c.members.iter().map(|&v| graph.external_id(v as usize)).collect::<Vec<_>>(),
                })
            })
            .collect();

        let path = dir.join(format!("partition_{}.json", report.partitions));
        let mut file = File::create(path)?;
        file.write_all(to_string_pretty(&json!({ "clusters": clusters_json }))?.as_bytes())?;
    }

    Ok(())
}
