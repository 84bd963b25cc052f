//! CSV edge-list handling for graph data

use std::path::Path;

use polars::prelude::*;

use crate::error::{ClusteringError, Result};
use crate::graph::{Graph, GraphBuilder};

/// Layout of an edge-list file
#[derive(Debug, Clone)]
pub struct EdgeListOptions {
    /// Field separator
    pub separator: u8,

    /// Whether the first line names the columns; without one columns are named "0", "1", ...
    pub has_header: bool,
}

impl Default for EdgeListOptions {
    fn default() -> Self {
        Self {
            separator: b' ',
            has_header: false,
        }
    }
}

/// Load an edge-list file into a DataFrame
pub fn read_edge_list(path: impl AsRef<Path>, options: &EdgeListOptions) -> Result<DataFrame> {
    let path = path.as_ref();
    log::info!("Reading edge list: {}", path.display());

    // Check if the file exists
    if !path.exists() {
        return Err(ClusteringError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("File not found: {}", path.display()),
        )));
    }

    let mut df = LazyCsvReader::new(path)
        .with_has_header(options.has_header)
        .with_separator(options.separator)
        .finish()?
        .collect()?;

    if !options.has_header {
        let names: Vec<String> = (0..df.width()).map(|i| i.to_string()).collect();
        df.set_column_names(names)?;
    }

    log::info!("File schema: {:?}", df.schema());
    log::info!("Loaded {} edges", df.height());

    Ok(df)
}

/// Feed the rows of an edge table into `builder` and build the graph
pub fn graph_from_dataframe(
    df: &DataFrame,
    mut builder: GraphBuilder,
    source: &str,
    destination: &str,
    weight: Option<&str>,
) -> Result<Graph> {
    let src_col = df.column(source)?.cast(&DataType::Int64)?;
    let dst_col = df.column(destination)?.cast(&DataType::Int64)?;
    let src = src_col.i64()?;
    let dst = dst_col.i64()?;

    let weight_col = match weight {
        Some(name) => Some(df.column(name)?.cast(&DataType::Float64)?),
        None => None,
    };
    let weights = match &weight_col {
        Some(col) => Some(col.f64()?),
        None => None,
    };

    let missing = |row: usize, column: &str| {
        ClusteringError::InvalidGraph(format!("row {} has no value in column {:?}", row, column))
    };

    for row in 0..df.height() {
        let s = src.get(row).ok_or_else(|| missing(row, source))?;
        let d = dst.get(row).ok_or_else(|| missing(row, destination))?;

        match (weights, weight) {
            (Some(w), Some(name)) => {
                let w = w.get(row).ok_or_else(|| missing(row, name))?;
                builder.add_weighted_edge(s, d, w);
            }
            _ => builder.add_edge(s, d),
        }
    }

    builder.build()
}
