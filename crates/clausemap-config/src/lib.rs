//! # clausemap configuration
//!
//! The analysis pipeline accepts a small [`AnalysisConfig`] record. It can be
//! built in code or loaded from the `[analysis]` table of a TOML file:
//!
//! ```toml
//! output_root = "~/contracts/analysis"
//!
//! [analysis]
//! indent_tolerance = 240
//! continuation_window = 2
//! emit_raw_copy = true
//! ```
//!
//! Missing keys fall back to their defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default indent tolerance in twentieths of a point (one sixth of an inch).
pub const DEFAULT_INDENT_TOLERANCE: i64 = 240;

/// Number of plain paragraphs a main clause may absorb as continuations.
pub const DEFAULT_CONTINUATION_WINDOW: usize = 2;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for `{key}`: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

/// Tunables for a single analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Maximum left-indent difference between a main clause and a plain
    /// paragraph for the paragraph to count as a continuation.
    pub indent_tolerance: i64,
    /// How many continuation paragraphs a main clause can collect.
    pub continuation_window: usize,
    /// Copy the source document into the analysis directory as `raw.docx`.
    pub emit_raw_copy: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            indent_tolerance: DEFAULT_INDENT_TOLERANCE,
            continuation_window: DEFAULT_CONTINUATION_WINDOW,
            emit_raw_copy: false,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.indent_tolerance < 0 {
            return Err(ConfigError::InvalidValue {
                key: "indent_tolerance",
                reason: format!("must not be negative (got {})", self.indent_tolerance),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Directory under which per-document analysis directories are created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_root: Option<PathBuf>,
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;
        config.analysis.validate()?;

        // Expand shell variables and tilde in the output root
        config.output_root = config
            .output_root
            .map(|root| Self::expand_path(&root).unwrap_or(root));

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/clausemap");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Analysis directory for a document, `<output_root>/<doc_id>` when a root is configured.
    pub fn analysis_dir_for(&self, doc_id: &str) -> Option<PathBuf> {
        self.output_root.as_ref().map(|root| root.join(doc_id))
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}
