use std::path::PathBuf;

use clausemap_config::ConfigError;

/// Fatal failures of an analysis run. Data anomalies never surface here; they
/// are recorded as block diagnostics instead.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Invalid input document: {0}")]
    InvalidInputDocument(String),
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to serialize {artifact}: {source}")]
    Serialize {
        artifact: &'static str,
        source: serde_json::Error,
    },
    #[error("Analysis directory is locked by another writer: {0}")]
    DirectoryLocked(PathBuf),
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
}

impl AnalysisError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failures constructing an [`ArtifactLoader`](crate::io::ArtifactLoader).
/// Queries on a constructed loader never fail.
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("Analysis directory not found: {0}")]
    DirectoryMissing(PathBuf),
    #[error("Required artifact missing: {file}")]
    ArtifactMissing { file: String },
    #[error("Malformed artifact {file}{}: {detail}", line_suffix(.line))]
    ArtifactMalformed {
        file: String,
        line: Option<usize>,
        detail: String,
    },
    #[error("IO error reading {file}: {source}")]
    Io {
        file: String,
        source: std::io::Error,
    },
}

fn line_suffix(line: &Option<usize>) -> String {
    line.map(|l| format!(" (line {l})")).unwrap_or_default()
}
