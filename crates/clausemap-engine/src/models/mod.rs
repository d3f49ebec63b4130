//! # Analysis data model
//!
//! Every type here is part of the on-disk artifact contract. Field names are
//! serialized verbatim (snake_case) and nullable fields are written as
//! explicit `null` rather than omitted.

pub mod artifacts;
pub mod attachment;
pub mod block;
pub mod list;
pub mod relationship;
pub mod section;

pub use artifacts::{IndexSummary, Manifest, SourceInfo, StyleUsage, StylesFile};
pub use attachment::{Attachment, AttachmentType};
pub use block::{Block, BlockType, Diagnostic, DiagnosticKind};
pub use list::{ListMeta, NumberFormat};
pub use relationship::{ListMetaSummary, RelationshipRecord, RelationshipSource, RelationshipsFile};
pub use section::{Section, SectionRole, SectionRoot, SectionTree};

/// Everything the pipeline computed for one document, ready for emission.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub doc_id: String,
    pub blocks: Vec<Block>,
    pub sections: SectionTree,
    pub relationships: Vec<RelationshipRecord>,
    pub styles: Vec<StyleUsage>,
    pub attachments: Vec<Attachment>,
    pub source: Option<SourceInfo>,
}

impl Analysis {
    /// Total number of sections in the tree, at every depth.
    pub fn section_count(&self) -> usize {
        self.sections.iter().count()
    }

    pub fn index_summary(&self) -> IndexSummary {
        IndexSummary {
            doc_id: self.doc_id.clone(),
            block_count: self.blocks.len(),
            section_count: self.section_count(),
            attachment_count: self.attachments.len(),
        }
    }
}
