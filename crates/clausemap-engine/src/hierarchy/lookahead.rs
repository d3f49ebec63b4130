use crate::models::{Block, ListMeta};

/// Labelled numbered blocks remembered for the lookahead comparison.
pub(crate) const RECENT_WINDOW: usize = 16;

/// For each position, the next block carrying an ordinal. The scan stops at
/// headings and attachment boundaries, which end every numbered series.
pub(crate) fn next_labelled(blocks: &[Block]) -> Vec<Option<usize>> {
    let mut next = vec![None; blocks.len()];
    let mut upcoming = None;
    for i in (0..blocks.len()).rev() {
        if blocks
            .get(i + 1)
            .is_some_and(|after| after.attachment_id != blocks[i].attachment_id)
        {
            upcoming = None;
        }
        next[i] = upcoming;
        let block = &blocks[i];
        if block.is_heading() {
            upcoming = None;
        } else if block.ordinal().is_some() {
            upcoming = Some(i);
        }
    }
    next
}

/// Same numbering instance, format and level.
pub(crate) fn same_signature(a: &ListMeta, b: &ListMeta) -> bool {
    a.num_id == b.num_id && a.format == b.format && a.level == b.level
}

/// `next` is the counter that directly follows `prev` under the same prefix.
pub(crate) fn follows(prev: &ListMeta, next: &ListMeta) -> bool {
    match (prev.current(), next.current()) {
        (Some(p), Some(n)) => prev.prefix() == next.prefix() && n == p + 1,
        _ => false,
    }
}
