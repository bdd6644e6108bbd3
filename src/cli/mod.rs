#![forbid(unsafe_code)]

//! Command-line support: CSV graph loading and the CLI config file.

/// TOML configuration for the `sombra-khops` binary.
pub mod config;

/// Loading edge-list CSV files into a [`crate::storage::MemGraph`].
pub mod import;

pub use config::{default_config_path, CliConfig, ConfigError};
pub use import::{load_graph, CliError, EdgeImportConfig, ImportSummary, NodeImportConfig};
