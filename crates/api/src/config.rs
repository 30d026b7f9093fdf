//! Application configuration loaded from environment variables and an
//! optional YAML policy file.

use std::path::{Path, PathBuf};

use domain::{LifecycleGraph, SlaPolicy};
use serde::Deserialize;
use thiserror::Error;

/// Configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The policy file could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The policy file is not valid YAML or fails policy validation.
    #[error("Invalid policy file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `LIFECYCLE_GRAPH` names no known graph.
    #[error("Invalid LIFECYCLE_GRAPH: {0}")]
    InvalidGraph(String),
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `SLA_POLICY_PATH`: YAML policy file (default: built-in 24/48/72h table)
/// - `ORDER_STORE_DIR`: directory for the file order store (default: memory only)
/// - `LIFECYCLE_GRAPH`: `strict` or `extended`, overriding the policy file
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub sla_policy_path: Option<PathBuf>,
    pub order_store_dir: Option<PathBuf>,
    pub lifecycle_graph: Option<LifecycleGraph>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let lifecycle_graph = match std::env::var("LIFECYCLE_GRAPH") {
            Ok(name) => Some(name.parse().map_err(ConfigError::InvalidGraph)?),
            Err(_) => None,
        };

        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            sla_policy_path: std::env::var_os("SLA_POLICY_PATH").map(PathBuf::from),
            order_store_dir: std::env::var_os("ORDER_STORE_DIR").map(PathBuf::from),
            lifecycle_graph,
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Resolves the lifecycle settings: the policy file if configured, then
    /// the `LIFECYCLE_GRAPH` override.
    pub fn lifecycle_settings(&self) -> Result<LifecycleSettings, ConfigError> {
        let mut settings = match &self.sla_policy_path {
            Some(path) => LifecycleSettings::from_file(path)?,
            None => LifecycleSettings::default(),
        };

        if let Some(graph) = self.lifecycle_graph {
            settings.lifecycle_graph = graph;
        }

        Ok(settings)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            sla_policy_path: None,
            order_store_dir: None,
            lifecycle_graph: None,
        }
    }
}

/// Contents of the policy file.
///
/// ```yaml
/// lifecycle_graph: strict
/// sla:
///   hours_by_priority:
///     1: 24
///     2: 48
///     3: 72
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LifecycleSettings {
    #[serde(default)]
    pub lifecycle_graph: LifecycleGraph,

    #[serde(default)]
    pub sla: SlaSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlaSettings {
    pub hours_by_priority: SlaPolicy,
}

impl LifecycleSettings {
    /// Parses settings from YAML text.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Reads and parses a policy file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&yaml).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
