//! Flat per-block projection of the hierarchy for `relationships.json`.

use crate::models::{
    Block, BlockType, ListMetaSummary, RelationshipRecord, RelationshipSource,
};

pub fn build_relationships(blocks: &[Block]) -> Vec<RelationshipRecord> {
    blocks.iter().map(relationship_for).collect()
}

pub fn relationship_for(block: &Block) -> RelationshipRecord {
    RelationshipRecord {
        block_id: block.id.clone(),
        parent_block_id: block.parent_block_id.clone(),
        child_block_ids: block.child_block_ids.clone(),
        sibling_ordinal: block.sibling_ordinal,
        source: source_of(block),
        restart_group_id: block.restart_group_id.clone(),
        list_meta: block.list.as_ref().map(|list| ListMetaSummary {
            num_id: list.num_id,
            abstract_num_id: list.abstract_num_id,
            level: list.level,
            ordinal: list.ordinal.clone(),
            format: list.format,
            list_instance_id: list.list_instance_id.clone(),
        }),
        attachment_id: block.attachment_id.clone(),
        clause_group_id: block.clause_group_id.clone(),
        continuation_of: block.continuation_of.clone(),
    }
}

fn source_of(block: &Block) -> RelationshipSource {
    match block.block_type {
        BlockType::Heading => RelationshipSource::Heading,
        BlockType::ListItem => RelationshipSource::List,
        BlockType::Paragraph if block.list.is_some() => RelationshipSource::Mixed,
        BlockType::Paragraph | BlockType::Table => RelationshipSource::Paragraph,
    }
}
