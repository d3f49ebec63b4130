use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::attachment::Attachment;

/// Artifact schema version written as `v`.
pub const SCHEMA_VERSION: u32 = 1;

/// Version tag of the structural rule set; bumped whenever inference output changes.
pub const RULESET_VERSION: &str = "clausemap-rules/1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub file_name: Option<String>,
    pub sha256: String,
}

/// Contents of `manifest.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub doc_id: String,
    pub v: u32,
    pub created_at: String,
    #[serde(default)]
    pub ruleset: Option<String>,
    #[serde(default)]
    pub source: Option<SourceInfo>,
    /// `sha256:<hex>` per emitted file name.
    pub checksums: BTreeMap<String, String>,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleUsage {
    pub style_id: Option<String>,
    pub style_name: String,
    pub count: usize,
}

/// Contents of `styles.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StylesFile {
    pub doc_id: String,
    pub styles: Vec<StyleUsage>,
}

/// Contents of `index.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSummary {
    pub doc_id: String,
    pub block_count: usize,
    pub section_count: usize,
    pub attachment_count: usize,
}
