use serde::{Deserialize, Serialize};

/// Rendering format of a numbering level (`w:numFmt`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NumberFormat {
    Decimal,
    DecimalZero,
    LowerLetter,
    UpperLetter,
    LowerRoman,
    UpperRoman,
    Bullet,
    None,
    Ordinal,
    CardinalText,
    OrdinalText,
    #[serde(other)]
    Other,
}

impl NumberFormat {
    pub fn from_ooxml(value: &str) -> Self {
        match value {
            "decimal" => Self::Decimal,
            "decimalZero" => Self::DecimalZero,
            "lowerLetter" => Self::LowerLetter,
            "upperLetter" => Self::UpperLetter,
            "lowerRoman" => Self::LowerRoman,
            "upperRoman" => Self::UpperRoman,
            "bullet" => Self::Bullet,
            "none" => Self::None,
            "ordinal" => Self::Ordinal,
            "cardinalText" => Self::CardinalText,
            "ordinalText" => Self::OrdinalText,
            _ => Self::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Decimal => "decimal",
            Self::DecimalZero => "decimalZero",
            Self::LowerLetter => "lowerLetter",
            Self::UpperLetter => "upperLetter",
            Self::LowerRoman => "lowerRoman",
            Self::UpperRoman => "upperRoman",
            Self::Bullet => "bullet",
            Self::None => "none",
            Self::Ordinal => "ordinal",
            Self::CardinalText => "cardinalText",
            Self::OrdinalText => "ordinalText",
            Self::Other => "other",
        }
    }
}

/// Numbering metadata of a block, present iff the paragraph references a list.
///
/// A block whose reference could not be resolved keeps a `ListMeta` with
/// `format = none`, an empty ordinal and no counters; downstream stages treat
/// it as an unlabelled member of the series rather than a numbered clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListMeta {
    pub num_id: u32,
    pub abstract_num_id: Option<u32>,
    /// 0-based list level (`w:ilvl`).
    pub level: u8,
    /// Running counters for levels `0..=level`.
    pub counters: Vec<u32>,
    pub ordinal: String,
    pub format: NumberFormat,
    pub pattern: String,
    pub is_legal: bool,
    pub restart_boundary: bool,
    pub list_instance_id: String,
    pub numbering_digest: Option<String>,
}

impl ListMeta {
    /// Metadata for a reference the numbering definitions cannot satisfy.
    pub fn unresolved(num_id: u32, level: u8) -> Self {
        Self {
            num_id,
            abstract_num_id: None,
            level,
            counters: Vec::new(),
            ordinal: String::new(),
            format: NumberFormat::None,
            pattern: String::new(),
            is_legal: false,
            restart_boundary: false,
            list_instance_id: list_instance_id(num_id),
            numbering_digest: None,
        }
    }

    /// Carries a visible label or bullet, i.e. takes part in the numbered series.
    /// A visible format without counters cannot be placed in a series and counts as unlabelled.
    pub fn is_labelled(&self) -> bool {
        self.format != NumberFormat::None && !self.counters.is_empty()
    }

    pub fn is_bullet(&self) -> bool {
        self.format == NumberFormat::Bullet
    }

    /// The counter of this block's own level.
    pub fn current(&self) -> Option<u32> {
        self.counters.last().copied()
    }

    /// Counters of the enclosing levels (`counters[:-1]`).
    pub fn prefix(&self) -> &[u32] {
        match self.counters.split_last() {
            Some((_, prefix)) => prefix,
            None => &[],
        }
    }
}

pub fn list_instance_id(num_id: u32) -> String {
    format!("list-{num_id}")
}
