use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentType {
    Schedule,
    Annex,
    Exhibit,
    Appendix,
}

impl AttachmentType {
    /// Parses a marker keyword, ignoring case.
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "schedule" => Some(Self::Schedule),
            "annex" => Some(Self::Annex),
            "exhibit" => Some(Self::Exhibit),
            "appendix" => Some(Self::Appendix),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Schedule => "schedule",
            Self::Annex => "annex",
            Self::Exhibit => "exhibit",
            Self::Appendix => "appendix",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Schedule => "Schedule",
            Self::Annex => "Annex",
            Self::Exhibit => "Exhibit",
            Self::Appendix => "Appendix",
        }
    }
}

/// A schedule-like sub-document. Its blocks are those carrying the same `attachment_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub attachment_id: String,
    #[serde(rename = "type")]
    pub attachment_type: AttachmentType,
    pub label: String,
    #[serde(default)]
    pub title: Option<String>,
}
