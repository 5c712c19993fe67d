//! Configuration for the bqfdw CLI
//!
//! Loads configuration from:
//! 1. bqfdw.yaml - wrapper options, foreign server, table columns, logging
//! 2. .env file - local overrides
//!
//! Environment variables always override bqfdw.yaml values.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use bqfdw_types::ColumnSpec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "bqfdw.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Option '{0}' must be a scalar, a list or a mapping")]
    InvalidOption(String),
}

/// Foreign server the generated DDL refers to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub name: String,
    /// Local schema imported tables are created in
    pub local_schema: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "bigquery_srv".to_string(),
            local_schema: "public".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or module-specific
    pub level: String,

    /// Output format: pretty, json, compact
    pub format: String,

    /// Output destination: stdout, file, both
    pub output: String,

    /// Directory for log files
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
            output: "stdout".to_string(),
            directory: "./logs".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Foreign table options, as the host would pass them to the wrapper
    pub wrapper: BTreeMap<String, serde_yaml::Value>,
    /// Columns of the foreign table scanned by `query` and `scan`
    pub columns: Vec<ColumnSpec>,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from YAML file with environment variable overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&contents)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load `path`, or `bqfdw.yaml` when present, or fall back to defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::load(DEFAULT_CONFIG_FILE),
            None => {
                let mut config = Self::default();
                config.apply_overrides(|key| std::env::var(key).ok());
                Ok(config)
            }
        }
    }

    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let wrapper_vars = [
            ("BQFDW_DATASET", "fdw_dataset"),
            ("BQFDW_TABLE", "fdw_table"),
            ("BQFDW_SQL_DIALECT", "fdw_sql_dialect"),
        ];
        for (var, key) in wrapper_vars {
            if let Some(value) = lookup(var) {
                // Drop the unprefixed spelling so the override wins
                self.wrapper.remove(key.trim_start_matches("fdw_"));
                self.wrapper.insert(key.to_string(), serde_yaml::Value::String(value));
            }
        }

        if let Some(name) = lookup("BQFDW_SERVER") {
            self.server.name = name;
        }

        if let Some(level) = lookup("RUST_LOG") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Some(output) = lookup("LOG_OUTPUT") {
            self.logging.output = output;
        }
        if let Some(dir) = lookup("LOG_DIR") {
            self.logging.directory = dir;
        }
    }

    /// Wrapper options flattened to the string map the option parser expects.
    ///
    /// Lists and mappings (e.g. `casting`) are JSON-encoded; null means empty.
    pub fn wrapper_options(&self) -> Result<HashMap<String, String>, ConfigError> {
        self.wrapper
            .iter()
            .map(|(key, value)| {
                let text = match value {
                    serde_yaml::Value::Null => String::new(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Sequence(_) | serde_yaml::Value::Mapping(_) => {
                        serde_json::to_string(value)
                            .map_err(|_| ConfigError::InvalidOption(key.clone()))?
                    }
                    serde_yaml::Value::Tagged(_) => return Err(ConfigError::InvalidOption(key.clone())),
                };
                Ok((key.clone(), text))
            })
            .collect()
    }
}
