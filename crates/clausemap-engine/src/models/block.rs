use serde::{Deserialize, Deserializer, Serialize};

use super::list::ListMeta;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Paragraph,
    Heading,
    ListItem,
    Table,
}

impl BlockType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Paragraph => "paragraph",
            Self::Heading => "heading",
            Self::ListItem => "list_item",
            Self::Table => "table",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    NumberingResolution,
    DuplicateOrdinal,
    DuplicateParaId,
}

/// A recoverable anomaly recorded on the block it concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// One line of `blocks.jsonl`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub text: String,
    pub style: String,
    #[serde(default)]
    pub style_id: Option<String>,
    pub para_id: String,
    /// Left indent in twips.
    #[serde(default, deserialize_with = "deserialize_indent")]
    pub indent: i64,
    #[serde(default)]
    pub level: Option<u8>,
    #[serde(default)]
    pub attachment_id: Option<String>,
    #[serde(default)]
    pub list: Option<ListMeta>,
    #[serde(default)]
    pub parent_block_id: Option<String>,
    #[serde(default)]
    pub child_block_ids: Vec<String>,
    #[serde(default)]
    pub sibling_ordinal: usize,
    pub clause_group_id: String,
    #[serde(default)]
    pub continuation_of: Option<String>,
    #[serde(default)]
    pub restart_group_id: Option<String>,
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

impl Block {
    pub fn is_heading(&self) -> bool {
        self.block_type == BlockType::Heading
    }

    pub fn is_table(&self) -> bool {
        self.block_type == BlockType::Table
    }

    /// Numbered with a visible label or bullet.
    pub fn is_labelled(&self) -> bool {
        self.list.as_ref().is_some_and(ListMeta::is_labelled)
    }

    /// References a list but renders no label (`format = none`, including demoted references).
    pub fn is_unlabelled(&self) -> bool {
        self.list.as_ref().is_some_and(|list| !list.is_labelled())
    }

    pub fn has_numbering(&self) -> bool {
        self.is_labelled()
    }

    /// The rendered ordinal, when non-empty.
    pub fn ordinal(&self) -> Option<&str> {
        self.list
            .as_ref()
            .map(|list| list.ordinal.as_str())
            .filter(|ordinal| !ordinal.is_empty())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IndentRepr {
    Twips(i64),
    Nested { left: Option<i64> },
}

fn deserialize_indent<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let repr = Option::<IndentRepr>::deserialize(deserializer)?;
    Ok(match repr {
        Some(IndentRepr::Twips(left)) => left,
        Some(IndentRepr::Nested { left }) => left.unwrap_or(0),
        None => 0,
    })
}
