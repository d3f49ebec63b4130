use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionRole {
    FrontMatter,
    OrderDetails,
    AgreementDate,
    Parties,
    Signatures,
    Definitions,
    MainBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub title: String,
    /// Depth in the table of contents, 1 to 6.
    pub level: u8,
    pub block_ids: Vec<String>,
    pub children: Vec<Section>,
    pub parent_id: Option<String>,
    pub role: Option<SectionRole>,
    pub attachment_id: Option<String>,
    pub char_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionRoot {
    pub children: Vec<Section>,
}

/// Contents of `sections.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionTree {
    pub doc_id: String,
    pub hierarchy_depth: usize,
    pub depth_max: u8,
    pub avg_blocks_per_section: f64,
    pub root: SectionRoot,
}

impl SectionTree {
    /// Pre-order walk over every section.
    pub fn iter(&self) -> SectionIter<'_> {
        SectionIter {
            stack: self.root.children.iter().rev().collect(),
        }
    }
}

pub struct SectionIter<'a> {
    stack: Vec<&'a Section>,
}

impl<'a> Iterator for SectionIter<'a> {
    type Item = &'a Section;

    fn next(&mut self) -> Option<Self::Item> {
        let section = self.stack.pop()?;
        self.stack.extend(section.children.iter().rev());
        Some(section)
    }
}
