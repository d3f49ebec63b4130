pub mod error;
pub mod hierarchy;
pub mod invariants;
pub mod io;
pub mod models;
pub mod numbering;
pub mod parsing;
pub mod pipeline;
pub mod relationships;
pub mod sections;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use error::{AnalysisError, LoaderError};
pub use io::{ArtifactLoader, DocumentStats, SearchQuery, write_artifacts};
pub use models::*;
pub use pipeline::{AnalyzedDocument, Pipeline};

pub use clausemap_config::{AnalysisConfig, Config};
