//! Structural checks over a finished [`Analysis`].
//!
//! The pipeline runs these before emission and logs every violation; the test
//! suites assert that none are reported.

use std::collections::{HashMap, HashSet};
use std::fmt;

use clausemap_config::DEFAULT_CONTINUATION_WINDOW;

use crate::models::{Analysis, Block, DiagnosticKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    /// Every referenced block id resolves.
    References,
    /// Parents precede their children and child lists agree with parent links.
    Forest,
    /// Each block sits in exactly one section.
    SectionPartition,
    SiblingOrdinal,
    Continuation,
    CounterMonotonic,
    OrdinalUnique,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub rule: Rule,
    pub block_id: Option<String>,
    pub detail: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.block_id {
            Some(id) => write!(f, "{:?} at {id}: {}", self.rule, self.detail),
            None => write!(f, "{:?}: {}", self.rule, self.detail),
        }
    }
}

struct Checker<'a> {
    blocks: &'a [Block],
    positions: HashMap<&'a str, usize>,
    out: Vec<Violation>,
}

impl<'a> Checker<'a> {
    fn report(&mut self, rule: Rule, block: Option<&Block>, detail: String) {
        self.out.push(Violation {
            rule,
            block_id: block.map(|b| b.id.clone()),
            detail,
        });
    }

    fn resolve(&mut self, block: &Block, field: &str, id: &str) -> Option<usize> {
        let found = self.positions.get(id).copied();
        if found.is_none() {
            self.report(
                Rule::References,
                Some(block),
                format!("{field} references unknown block {id}"),
            );
        }
        found
    }
}

/// Check with the default continuation window.
pub fn check(analysis: &Analysis) -> Vec<Violation> {
    check_with_window(analysis, DEFAULT_CONTINUATION_WINDOW)
}

pub fn check_with_window(analysis: &Analysis, continuation_window: usize) -> Vec<Violation> {
    let blocks = analysis.blocks.as_slice();
    let mut checker = Checker {
        blocks,
        positions: HashMap::with_capacity(blocks.len()),
        out: Vec::new(),
    };
    for (i, block) in blocks.iter().enumerate() {
        if checker.positions.insert(block.id.as_str(), i).is_some() {
            checker.report(Rule::References, Some(block), "block id is not unique".into());
        }
    }

    check_links(&mut checker);
    check_sections(&mut checker, analysis);
    check_relationships(&mut checker, analysis);
    check_continuations(&mut checker, continuation_window);
    check_counters(&mut checker);
    checker.out
}

fn check_links(c: &mut Checker<'_>) {
    let blocks = c.blocks;
    let mut root_children = Vec::new();
    for (i, block) in blocks.iter().enumerate() {
        match block.parent_block_id.as_deref() {
            None => root_children.push(i),
            Some(parent_id) => {
                if let Some(p) = c.resolve(block, "parent_block_id", parent_id) {
                    if p >= i {
                        c.report(Rule::Forest, Some(block), format!("parent {parent_id} does not precede it"));
                    } else if !blocks[p].child_block_ids.contains(&block.id) {
                        c.report(Rule::Forest, Some(block), format!("missing from {parent_id}'s children"));
                    }
                }
            }
        }

        for (ordinal, child_id) in block.child_block_ids.iter().enumerate() {
            let Some(ci) = c.resolve(block, "child_block_ids", child_id) else {
                continue;
            };
            let child = &blocks[ci];
            if child.parent_block_id.as_deref() != Some(block.id.as_str()) {
                c.report(Rule::Forest, Some(block), format!("child {child_id} points elsewhere"));
            }
            if child.sibling_ordinal != ordinal {
                c.report(
                    Rule::SiblingOrdinal,
                    Some(child),
                    format!("sibling_ordinal {} but position {ordinal}", child.sibling_ordinal),
                );
            }
        }

        c.resolve(block, "clause_group_id", &block.clause_group_id);
        if let Some(id) = &block.restart_group_id {
            c.resolve(block, "restart_group_id", id);
        }
    }

    for (ordinal, &i) in root_children.iter().enumerate() {
        let block = &blocks[i];
        if block.sibling_ordinal != ordinal {
            c.report(
                Rule::SiblingOrdinal,
                Some(block),
                format!("root sibling_ordinal {} but position {ordinal}", block.sibling_ordinal),
            );
        }
    }
}

fn check_sections(c: &mut Checker<'_>, analysis: &Analysis) {
    let mut seen: HashSet<&str> = HashSet::new();
    for section in analysis.sections.iter() {
        for block_id in &section.block_ids {
            if !c.positions.contains_key(block_id.as_str()) {
                c.report(
                    Rule::References,
                    None,
                    format!("section {} lists unknown block {block_id}", section.id),
                );
            } else if !seen.insert(block_id.as_str()) {
                c.report(
                    Rule::SectionPartition,
                    None,
                    format!("block {block_id} appears in more than one section"),
                );
            }
        }
    }
    let blocks = c.blocks;
    for block in blocks {
        if !seen.contains(block.id.as_str()) {
            c.report(Rule::SectionPartition, Some(block), "not in any section".into());
        }
    }
}

fn check_relationships(c: &mut Checker<'_>, analysis: &Analysis) {
    for record in &analysis.relationships {
        let ids = std::iter::once(&record.block_id)
            .chain(record.parent_block_id.iter())
            .chain(record.child_block_ids.iter());
        for id in ids {
            if !c.positions.contains_key(id.as_str()) {
                c.report(
                    Rule::References,
                    None,
                    format!("relationship for {} references unknown block {id}", record.block_id),
                );
            }
        }
    }
}

fn check_continuations(c: &mut Checker<'_>, window: usize) {
    let blocks = c.blocks;
    let mut per_clause: HashMap<&str, usize> = HashMap::new();
    for (i, block) in blocks.iter().enumerate() {
        let Some(main_id) = block.continuation_of.as_deref() else {
            continue;
        };
        let Some(m) = c.resolve(block, "continuation_of", main_id) else {
            continue;
        };
        if block.clause_group_id != main_id || blocks[m].clause_group_id != main_id {
            c.report(Rule::Continuation, Some(block), format!("clause group disagrees with {main_id}"));
        }

        let count = per_clause.entry(main_id).or_default();
        *count += 1;
        if *count > window {
            c.report(Rule::Continuation, Some(block), format!("more than {window} continuations"));
        }

        let previous = i.checked_sub(1).map(|p| &blocks[p]);
        let adjacent = previous.is_some_and(|p| {
            p.id == main_id || p.continuation_of.as_deref() == Some(main_id)
        });
        if !adjacent {
            c.report(Rule::Continuation, Some(block), format!("not consecutive after {main_id}"));
        }
    }
}

fn check_counters(c: &mut Checker<'_>) {
    // (num_id, level) -> prefix -> last counter in the current restart window
    let mut counters: HashMap<(u32, u8), HashMap<Vec<u32>, u32>> = HashMap::new();
    // (num_id, level) -> ordinals seen in the current restart window
    let mut ordinals: HashMap<(u32, u8), HashSet<String>> = HashMap::new();

    let blocks = c.blocks;
    for block in blocks {
        let Some(list) = block.list.as_ref().filter(|l| l.is_labelled()) else {
            continue;
        };
        let key = (list.num_id, list.level);
        if list.restart_boundary {
            counters.remove(&key);
            ordinals.remove(&key);
        }

        if let Some(current) = list.current() {
            let window = counters.entry(key).or_default();
            if let Some(&last) = window.get(list.prefix())
                && current != last + 1
            {
                c.report(
                    Rule::CounterMonotonic,
                    Some(block),
                    format!("counter {current} follows {last} at level {}", list.level),
                );
            }
            window.insert(list.prefix().to_vec(), current);
        }

        if list.ordinal.is_empty() {
            continue;
        }
        let fresh = ordinals.entry(key).or_default().insert(list.ordinal.clone());
        let diagnosed = block
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::DuplicateOrdinal);
        if !fresh && !diagnosed {
            c.report(
                Rule::OrdinalUnique,
                Some(block),
                format!("ordinal {} repeats without a diagnostic", list.ordinal),
            );
        }
    }
}
