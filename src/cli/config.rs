use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::traversal::{EngineKind, KhopsOptions};

use super::import::{EdgeImportConfig, NodeImportConfig};

/// Settings read from `khops.toml`. Every key is optional.
#[derive(Debug, Default)]
pub struct CliConfig {
    data: RawConfig,
    delimiter: Option<u8>,
    engine: Option<EngineKind>,
}

impl CliConfig {
    /// Loads `explicit`, or the default path when it exists.
    ///
    /// A missing file yields the empty config; an unreadable or malformed
    /// one is an error.
    pub fn load(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = explicit.or_else(default_config_path);
        let data = match path.as_ref() {
            Some(config_path) if config_path.exists() => {
                let data = read_file(config_path)?;
                debug!(path = %config_path.display(), "cli.config.loaded");
                data
            }
            _ => RawConfig::default(),
        };
        let delimiter = parse_delimiter(&data.import.delimiter)?;
        let engine = parse_engine(&data.engine.kind)?;
        Ok(Self {
            data,
            delimiter,
            engine,
        })
    }

    /// Engine named by `engine.kind`, if set.
    pub fn engine(&self) -> Option<EngineKind> {
        self.engine
    }

    /// Traversal options from the `[engine]` table.
    pub fn khops_options(&self) -> KhopsOptions {
        let mut options = KhopsOptions::new();
        if let Some(parallelism) = self.data.engine.parallelism {
            options = options.parallelism(parallelism);
        }
        if let Some(ms) = self.data.engine.deadline_ms {
            options = options.deadline(Duration::from_millis(ms));
        }
        options
    }

    /// Applies `[import]` column names and delimiter to an edge import.
    pub fn apply_edge_columns(&self, cfg: &mut EdgeImportConfig) {
        let import = &self.data.import;
        if let Some(col) = &import.src_column {
            cfg.src_column = col.clone();
        }
        if let Some(col) = &import.dst_column {
            cfg.dst_column = col.clone();
        }
        if let Some(col) = &import.type_column {
            cfg.type_column = Some(col.clone());
        }
        if let Some(delimiter) = self.delimiter {
            cfg.delimiter = delimiter;
        }
    }

    /// Applies `[import]` settings to a node import.
    pub fn apply_node_columns(&self, cfg: &mut NodeImportConfig) {
        if let Some(col) = &self.data.import.id_column {
            cfg.id_column = col.clone();
        }
        if let Some(delimiter) = self.delimiter {
            cfg.delimiter = delimiter;
        }
    }
}

fn read_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_delimiter(raw: &Option<String>) -> Result<Option<u8>, ConfigError> {
    let Some(value) = raw.as_deref() else {
        return Ok(None);
    };
    match value.as_bytes() {
        [byte] => Ok(Some(*byte)),
        _ if value == "\\t" => Ok(Some(b'\t')),
        _ => Err(ConfigError::InvalidDelimiter {
            value: value.to_string(),
        }),
    }
}

fn parse_engine(raw: &Option<String>) -> Result<Option<EngineKind>, ConfigError> {
    match raw.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => Ok(None),
        Some("sequential") => Ok(Some(EngineKind::Sequential)),
        Some("parallel") => Ok(Some(EngineKind::Parallel)),
        Some(_) => Err(ConfigError::InvalidEngine {
            value: raw.clone().unwrap_or_default(),
        }),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    engine: EngineSection,
    #[serde(default)]
    import: ImportSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct EngineSection {
    kind: Option<String>,
    parallelism: Option<usize>,
    deadline_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ImportSection {
    src_column: Option<String>,
    dst_column: Option<String>,
    type_column: Option<String>,
    id_column: Option<String>,
    delimiter: Option<String>,
}

/// Errors raised while loading the CLI config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read CLI config {path}: {source}")]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// The file is not valid TOML for this schema.
    #[error("failed to parse CLI config {path}: {source}")]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
    /// `import.delimiter` is not a single byte.
    #[error("import delimiter '{value}' must be a single ASCII character")]
    InvalidDelimiter {
        /// Offending value.
        value: String,
    },
    /// `engine.kind` is neither `sequential` nor `parallel`.
    #[error("engine kind '{value}' is invalid; expected 'sequential' or 'parallel'")]
    InvalidEngine {
        /// Offending value.
        value: String,
    },
}

/// `$XDG_CONFIG_HOME/sombra/khops.toml` or the platform equivalent.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("sombra").join("khops.toml"))
}
