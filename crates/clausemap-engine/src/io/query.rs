use serde::Serialize;

use crate::models::{Block, BlockType};

/// Conjunctive block filter; unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    /// Case-insensitive substring of the block text.
    pub text: Option<String>,
    pub block_type: Option<BlockType>,
    /// Style name, compared case-insensitively.
    pub style: Option<String>,
    pub has_numbering: Option<bool>,
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn block_type(mut self, block_type: BlockType) -> Self {
        self.block_type = Some(block_type);
        self
    }

    pub fn style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn has_numbering(mut self, has_numbering: bool) -> Self {
        self.has_numbering = Some(has_numbering);
        self
    }

    pub(crate) fn matcher(&self) -> impl Fn(&Block) -> bool + '_ {
        let needle = self.text.as_ref().map(|t| t.to_lowercase());
        move |block: &Block| {
            needle
                .as_ref()
                .is_none_or(|n| block.text.to_lowercase().contains(n.as_str()))
                && self.block_type.is_none_or(|t| block.block_type == t)
                && self
                    .style
                    .as_ref()
                    .is_none_or(|s| block.style.eq_ignore_ascii_case(s))
                && self
                    .has_numbering
                    .is_none_or(|wanted| block.has_numbering() == wanted)
        }
    }
}

/// Document-level counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentStats {
    pub block_count: usize,
    pub section_count: usize,
    pub attachment_count: usize,
    pub heading_count: usize,
    pub numbered_count: usize,
    pub table_count: usize,
    pub continuation_count: usize,
    pub clause_group_count: usize,
    pub hierarchy_depth: usize,
}
