//! Edge-list loading

pub mod csv;

pub use self::csv::{graph_from_dataframe, read_edge_list, EdgeListOptions};
