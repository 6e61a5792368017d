//! Configuration loading for cordsift.
//! Reads cordsift.toml from the current directory or the path in CORDSIFT_CONFIG.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::warn;

use cordsift_common::CordsiftError;
use cordsift_db::{Filter, ReshapeMode};
use cordsift_embed::EmbeddingConfig;
use cordsift_scan::{OutputConfig, ScanConfig, SentencizerConfig};

pub const CONFIG_ENV: &str = "CORDSIFT_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "cordsift.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub sentencizer: SentencizerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_uri")]
    pub uri: String,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub reshape: ReshapeMode,
}

fn default_uri()  -> String { "mongodb://localhost:56789".to_string() }
fn default_name() -> String { "CORD-19".to_string() }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            name: default_name(),
            reshape: ReshapeMode::default(),
        }
    }
}


impl Config {
    /// Load configuration.
    ///
    /// `explicit` (from `--config`) wins over CORDSIFT_CONFIG, which wins
    /// over ./cordsift.toml. A named file must exist; a missing default file
    /// falls back to built-in defaults.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let named = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        let path = match named {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                path
            }
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !path.exists() {
                    warn!(
                        "No {} found, using built-in defaults. \
                         Copy cordsift.example.toml to cordsift.toml to customise.",
                        DEFAULT_CONFIG_FILE
                    );
                    let config = Config::default();
                    config.validate()?;
                    return Ok(config);
                }
                path
            }
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would only fail later, mid-scan.
    pub fn validate(&self) -> cordsift_common::Result<()> {
        self.scan.validate()?;
        if self.database.name.is_empty() {
            return Err(CordsiftError::Config("database.name must not be empty".to_string()));
        }
        if self.embedding.max_length < 2 {
            return Err(CordsiftError::Config(format!(
                "embedding.max_length must be at least 2, got {}",
                self.embedding.max_length
            )));
        }
        if self.sentencizer.punct_chars.is_empty() {
            return Err(CordsiftError::Config(
                "sentencizer.punct_chars must not be empty".to_string(),
            ));
        }
        self.scan_filter()?;
        Ok(())
    }

    /// The parsed `scan.filter`, if one is set.
    pub fn scan_filter(&self) -> cordsift_common::Result<Option<Filter>> {
        self.scan
            .filter
            .as_deref()
            .map(|json| {
                Filter::parse_json(json)
                    .map_err(|e| CordsiftError::Config(format!("scan.filter: {e}")))
            })
            .transpose()
    }
}
