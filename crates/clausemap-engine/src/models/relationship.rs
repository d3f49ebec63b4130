use serde::{Deserialize, Serialize};

use super::list::NumberFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipSource {
    Heading,
    List,
    Mixed,
    Paragraph,
}

/// The subset of list metadata carried by relationship records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListMetaSummary {
    pub num_id: u32,
    pub abstract_num_id: Option<u32>,
    pub level: u8,
    pub ordinal: String,
    pub format: NumberFormat,
    pub list_instance_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipRecord {
    pub block_id: String,
    pub parent_block_id: Option<String>,
    pub child_block_ids: Vec<String>,
    pub sibling_ordinal: usize,
    pub source: RelationshipSource,
    pub restart_group_id: Option<String>,
    pub list_meta: Option<ListMetaSummary>,
    pub attachment_id: Option<String>,
    pub clause_group_id: String,
    pub continuation_of: Option<String>,
}

/// Contents of `relationships.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipsFile {
    pub doc_id: String,
    pub relationships: Vec<RelationshipRecord>,
}
