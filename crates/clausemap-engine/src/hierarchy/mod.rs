//! # Hierarchy inference
//!
//! One forward pass assigns every block a parent, a sibling position and a
//! clause group. Parents always precede their children, so the result is a
//! forest under the virtual document root.
//!
//! ## Walk state
//!
//! - Heading stack: active styled headings by level.
//! - List stack: numbered blocks in scope; levels strictly increase within one instance.
//! - Counter-prefix map: full counters of a numbered block to that block.
//! - Clause context: the latest main clause and its remaining continuation window.
//! - Plain-run map: first plain paragraph under each parent since the last clause boundary.
//!
//! Entering a different attachment discards all of it.

mod lookahead;

use std::collections::{HashMap, VecDeque};

use clausemap_config::AnalysisConfig;
use tracing::{debug, info};

use crate::models::Block;
use lookahead::{RECENT_WINDOW, follows, next_labelled, same_signature};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParentRule {
    HeadingStack,
    ListStack,
    CounterPrefix,
    Lookahead,
    LastLevelZero,
    RecentNumbered,
    Container,
    Continuation,
}

#[derive(Debug, Clone, Default)]
struct Link {
    parent: Option<usize>,
    group: usize,
    continuation_of: Option<usize>,
    restart_group: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
struct ListEntry {
    num_id: u32,
    level: u8,
    index: usize,
}

#[derive(Debug, Clone, Copy)]
struct ClauseContext {
    root: usize,
    indent: i64,
    window: usize,
}

#[derive(Debug, Default)]
struct WalkState {
    attachment: Option<String>,
    headings: Vec<(u8, usize)>,
    lists: Vec<ListEntry>,
    prefixes: HashMap<Vec<u32>, usize>,
    recent: VecDeque<usize>,
    clause: Option<ClauseContext>,
    last_main: Option<usize>,
    last_level_zero: Option<usize>,
    plain_runs: HashMap<Option<usize>, usize>,
    restart_runs: HashMap<(u32, u8), usize>,
}

impl WalkState {
    fn for_attachment(attachment: Option<String>) -> Self {
        Self {
            attachment,
            ..Self::default()
        }
    }

    /// Innermost open clause, else innermost heading.
    fn container(&self) -> Option<usize> {
        self.lists
            .last()
            .map(|e| e.index)
            .or_else(|| self.headings.last().map(|&(_, index)| index))
    }

    fn close_window(&mut self) {
        if let Some(clause) = self.clause.as_mut() {
            clause.window = 0;
        }
    }

    fn remember_recent(&mut self, index: usize) {
        self.recent.push_back(index);
        if self.recent.len() > RECENT_WINDOW {
            self.recent.pop_front();
        }
    }
}

pub struct HierarchyInferrer {
    indent_tolerance: i64,
    continuation_window: usize,
}

impl HierarchyInferrer {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            indent_tolerance: config.indent_tolerance,
            continuation_window: config.continuation_window,
        }
    }

    /// Fill the enrichment fields of every block in place.
    pub fn infer(&self, blocks: &mut [Block]) {
        let next = next_labelled(blocks);
        let mut links: Vec<Link> = Vec::with_capacity(blocks.len());
        let mut state = WalkState::default();
        let mut continuations = 0usize;

        for (i, block) in blocks.iter().enumerate() {
            if block.attachment_id != state.attachment {
                state = WalkState::for_attachment(block.attachment_id.clone());
            }

            let restart_group = block
                .list
                .as_ref()
                .filter(|list| list.is_labelled())
                .map(|list| {
                    let key = (list.num_id, list.level);
                    if list.restart_boundary || !state.restart_runs.contains_key(&key) {
                        state.restart_runs.insert(key, i);
                    }
                    state.restart_runs[&key]
                });

            let (mut link, rule) = if block.is_heading() {
                self.heading(&mut state, i, block)
            } else if block.is_labelled() {
                self.numbered(&mut state, i, block)
            } else if block.is_unlabelled() {
                self.unlabelled(&mut state, i, blocks, &next, &links)
            } else if block.is_table() {
                self.table(&mut state, i)
            } else {
                self.plain(&mut state, i, block)
            };
            link.restart_group = restart_group;
            if link.continuation_of.is_some() {
                continuations += 1;
            }

            debug!(
                block = %block.id,
                rule = ?rule,
                parent = ?link.parent.map(|p| blocks[p].id.as_str()),
                group = %blocks[link.group].id,
                "hierarchy"
            );
            links.push(link);
        }

        apply_links(blocks, &links);
        info!(
            blocks = blocks.len(),
            roots = blocks.iter().filter(|b| b.parent_block_id.is_none()).count(),
            continuations,
            "hierarchy inferred"
        );
    }

    fn heading(&self, state: &mut WalkState, i: usize, block: &Block) -> (Link, ParentRule) {
        let level = block.level.unwrap_or(1);
        while state.headings.last().is_some_and(|&(l, _)| l >= level) {
            state.headings.pop();
        }
        let parent = state.headings.last().map(|&(_, index)| index);
        state.headings.push((level, i));

        state.lists.clear();
        state.prefixes.clear();
        state.recent.clear();
        state.plain_runs.clear();
        state.clause = None;
        state.last_main = None;
        state.last_level_zero = None;

        (
            Link {
                parent,
                group: i,
                ..Link::default()
            },
            ParentRule::HeadingStack,
        )
    }

    fn numbered(&self, state: &mut WalkState, i: usize, block: &Block) -> (Link, ParentRule) {
        let Some(list) = block.list.as_ref() else {
            return self.plain(state, i, block);
        };
        let (num_id, level) = (list.num_id, list.level);

        let lower = state
            .lists
            .iter()
            .rposition(|e| e.num_id == num_id && e.level < level);
        let (parent, rule) = match lower {
            Some(p) => {
                state.lists.truncate(p + 1);
                (Some(state.lists[p].index), ParentRule::ListStack)
            }
            None => {
                if let Some(q) = state
                    .lists
                    .iter()
                    .position(|e| e.num_id == num_id && e.level >= level)
                {
                    state.lists.truncate(q);
                }
                let by_prefix = (!list.prefix().is_empty())
                    .then(|| state.prefixes.get(list.prefix()).copied())
                    .flatten();
                match by_prefix {
                    Some(p) => (Some(p), ParentRule::CounterPrefix),
                    // Bullets belong to whatever clause is open around them.
                    None if list.is_bullet() => (state.container(), ParentRule::Container),
                    None => (
                        state.headings.last().map(|&(_, index)| index),
                        ParentRule::HeadingStack,
                    ),
                }
            }
        };

        state.lists.push(ListEntry {
            num_id,
            level,
            index: i,
        });
        state.plain_runs.clear();

        if list.is_bullet() {
            state.close_window();
        } else {
            state.prefixes.insert(list.counters.clone(), i);
            state.remember_recent(i);
            if level == 0 {
                state.last_level_zero = Some(i);
            }
            if level == 0 || is_main_clause_style(&block.style) {
                state.clause = Some(ClauseContext {
                    root: i,
                    indent: block.indent,
                    window: self.continuation_window,
                });
                state.last_main = Some(i);
            } else {
                state.close_window();
            }
        }

        (
            Link {
                parent,
                group: i,
                ..Link::default()
            },
            rule,
        )
    }

    /// `format = none` members of a series: place them where the next visible
    /// ordinal says the series continues.
    fn unlabelled(
        &self,
        state: &mut WalkState,
        i: usize,
        blocks: &[Block],
        next: &[Option<usize>],
        links: &[Link],
    ) -> (Link, ParentRule) {
        state.close_window();

        let confirmed = next[i].and_then(|n| {
            let upcoming = blocks[n].list.as_ref()?;
            let predecessor = state.recent.iter().rev().copied().find(|&r| {
                blocks[r]
                    .list
                    .as_ref()
                    .is_some_and(|l| same_signature(l, upcoming))
            })?;
            let previous = blocks[predecessor].list.as_ref()?;
            follows(previous, upcoming).then_some(predecessor)
        });

        let (parent, rule) = match confirmed {
            Some(predecessor) => (links[predecessor].parent, ParentRule::Lookahead),
            None => match (state.last_level_zero, state.recent.back()) {
                (Some(z), _) => (Some(z), ParentRule::LastLevelZero),
                (None, Some(&r)) => (Some(r), ParentRule::RecentNumbered),
                (None, None) => (state.container(), ParentRule::Container),
            },
        };

        (
            Link {
                parent,
                group: state.last_main.unwrap_or(i),
                ..Link::default()
            },
            rule,
        )
    }

    fn table(&self, state: &mut WalkState, i: usize) -> (Link, ParentRule) {
        state.close_window();
        let parent = state.container();
        state.plain_runs.remove(&parent);
        (
            Link {
                parent,
                group: i,
                ..Link::default()
            },
            ParentRule::Container,
        )
    }

    fn plain(&self, state: &mut WalkState, i: usize, block: &Block) -> (Link, ParentRule) {
        if let Some(clause) = state.clause.as_mut()
            && clause.window > 0
            && (block.indent - clause.indent).abs() <= self.indent_tolerance
        {
            clause.window -= 1;
            return (
                Link {
                    parent: Some(clause.root),
                    group: clause.root,
                    continuation_of: Some(clause.root),
                    restart_group: None,
                },
                ParentRule::Continuation,
            );
        }

        state.close_window();
        let parent = state.container();
        let group = *state.plain_runs.entry(parent).or_insert(i);
        (
            Link {
                parent,
                group,
                ..Link::default()
            },
            ParentRule::Container,
        )
    }
}

fn is_main_clause_style(style: &str) -> bool {
    let style = style.to_ascii_lowercase();
    style.starts_with("list number") || style == "list paragraph"
}

fn apply_links(blocks: &mut [Block], links: &[Link]) {
    let ids: Vec<String> = blocks.iter().map(|b| b.id.clone()).collect();
    let mut children: Vec<Vec<String>> = vec![Vec::new(); blocks.len()];
    let mut root_count = 0;

    for (i, link) in links.iter().enumerate() {
        let block = &mut blocks[i];
        block.sibling_ordinal = match link.parent {
            Some(p) => {
                children[p].push(ids[i].clone());
                children[p].len() - 1
            }
            None => {
                root_count += 1;
                root_count - 1
            }
        };
        block.parent_block_id = link.parent.map(|p| ids[p].clone());
        block.clause_group_id = ids[link.group].clone();
        block.continuation_of = link.continuation_of.map(|c| ids[c].clone());
        block.restart_group_id = link.restart_group.map(|r| ids[r].clone());
    }

    for (block, child_ids) in blocks.iter_mut().zip(children) {
        block.child_block_ids = child_ids;
    }
}
