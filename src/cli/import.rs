use std::path::PathBuf;

use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::storage::MemGraph;
use crate::types::{KhopsError, NodeId};

use super::config::ConfigError;

/// Configuration for loading edges from a CSV file.
#[derive(Debug, Clone)]
pub struct EdgeImportConfig {
    /// Path to the CSV file containing edge data.
    pub path: PathBuf,
    /// Name of the CSV column containing source node identifiers.
    pub src_column: String,
    /// Name of the CSV column containing destination node identifiers.
    pub dst_column: String,
    /// CSV column name containing the edge type.
    pub type_column: Option<String>,
    /// Static edge type applied to every edge; takes precedence over `type_column`.
    pub static_type: Option<String>,
    /// Field delimiter.
    pub delimiter: u8,
}

impl EdgeImportConfig {
    /// Defaults: `src`, `dst` and `type` columns, comma separated.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            src_column: "src".into(),
            dst_column: "dst".into(),
            type_column: Some("type".into()),
            static_type: None,
            delimiter: b',',
        }
    }
}

/// Configuration for loading standalone nodes (nodes without edges).
#[derive(Debug, Clone)]
pub struct NodeImportConfig {
    /// Path to the CSV file containing node data.
    pub path: PathBuf,
    /// Name of the CSV column containing unique node identifiers.
    pub id_column: String,
    /// Field delimiter.
    pub delimiter: u8,
}

impl NodeImportConfig {
    /// Defaults: an `id` column, comma separated.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            id_column: "id".into(),
            delimiter: b',',
        }
    }
}

/// Summary statistics from loading a graph.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ImportSummary {
    /// Rows read from the nodes file.
    pub nodes_imported: u64,
    /// Rows read from the edges file.
    pub edges_imported: u64,
    /// Distinct nodes in the resulting graph.
    pub node_count: usize,
    /// Distinct relationship types in the resulting graph.
    pub relationship_types: usize,
}

/// Error type for CLI operations.
#[derive(Error, Debug)]
pub enum CliError {
    /// Generic error message.
    #[error("{0}")]
    Message(String),
    /// IO error from file operations.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// CSV parsing error.
    #[error(transparent)]
    Csv(#[from] csv::Error),
    /// Config file error.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Traversal or storage error.
    #[error(transparent)]
    Khops(#[from] KhopsError),
}

/// Where each imported edge gets its relationship type from.
#[derive(Clone, Copy)]
enum TypeSource<'a> {
    Column(usize),
    Static(&'a str),
}

/// Builds an in-memory graph from an edges CSV and an optional nodes CSV.
pub fn load_graph(
    edges: &EdgeImportConfig,
    nodes: Option<&NodeImportConfig>,
) -> Result<(MemGraph, ImportSummary), CliError> {
    let mut graph = MemGraph::new();
    let mut summary = ImportSummary::default();
    if let Some(nodes) = nodes {
        summary.nodes_imported = import_nodes(&mut graph, nodes)?;
    }
    summary.edges_imported = import_edges(&mut graph, edges)?;
    summary.node_count = graph.node_count();
    summary.relationship_types = graph.types().len();
    info!(
        edges = summary.edges_imported,
        nodes = summary.node_count,
        types = summary.relationship_types,
        "cli.import.loaded"
    );
    Ok((graph, summary))
}

fn import_nodes(graph: &mut MemGraph, cfg: &NodeImportConfig) -> Result<u64, CliError> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .delimiter(cfg.delimiter)
        .from_path(&cfg.path)?;
    let headers = reader.headers()?.clone();
    let id_index = find_column(&headers, &cfg.id_column)?;

    let mut imported = 0u64;
    for result in reader.records() {
        let record = result?;
        let id = parse_node_id(&record, id_index, &cfg.id_column)?;
        if !graph.add_node(id) {
            return Err(CliError::Message(format!(
                "duplicate node id '{}' in nodes file",
                id
            )));
        }
        imported += 1;
    }
    debug!(imported, path = %cfg.path.display(), "cli.import.nodes");
    Ok(imported)
}

fn import_edges(graph: &mut MemGraph, cfg: &EdgeImportConfig) -> Result<u64, CliError> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .delimiter(cfg.delimiter)
        .from_path(&cfg.path)?;
    let headers = reader.headers()?.clone();
    let src_index = find_column(&headers, &cfg.src_column)?;
    let dst_index = find_column(&headers, &cfg.dst_column)?;
    let type_source = match (&cfg.static_type, &cfg.type_column) {
        (Some(ty), _) => TypeSource::Static(ty.as_str()),
        (None, Some(col)) => TypeSource::Column(find_column(&headers, col)?),
        (None, None) => {
            return Err(CliError::Message(
                "edge import requires --edge-type or --edge-type-column".into(),
            ))
        }
    };

    let mut imported = 0u64;
    for result in reader.records() {
        let record = result?;
        let src = parse_node_id(&record, src_index, &cfg.src_column)?;
        let dst = parse_node_id(&record, dst_index, &cfg.dst_column)?;
        let ty = match type_source {
            TypeSource::Column(idx) => get_required(&record, idx, "type")?,
            TypeSource::Static(ty) => ty,
        };
        graph.add_edge(src, dst, ty)?;
        imported += 1;
    }
    debug!(imported, path = %cfg.path.display(), "cli.import.edges");
    Ok(imported)
}

fn find_column(headers: &StringRecord, name: &str) -> Result<usize, CliError> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
        .ok_or_else(|| CliError::Message(format!("column '{}' not found", name)))
}

fn get_required<'a>(record: &'a StringRecord, idx: usize, name: &str) -> Result<&'a str, CliError> {
    record
        .get(idx)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CliError::Message(format!("missing value for column '{}'", name)))
}

fn parse_node_id(record: &StringRecord, idx: usize, name: &str) -> Result<NodeId, CliError> {
    let raw = get_required(record, idx, name)?;
    raw.parse::<u64>().map(NodeId).map_err(|_| {
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        CliError::Message(format!(
            "line {}: column '{}' value '{}' is not a node id",
            line, name, raw
        ))
    })
}
