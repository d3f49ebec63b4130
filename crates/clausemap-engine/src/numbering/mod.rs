//! # Numberer
//!
//! Resolves each block's raw numbering reference into a rendered ordinal with a
//! per-instance counter state machine.
//!
//! ## Counter rules
//!
//! - A level starts at its start value (or the instance's `startOverride` on first use).
//! - Emitting level *k* truncates deeper levels that use the default restart rule.
//! - `lvlRestart = j` resets level *k* when any level `<= j` changed since *k* last emitted.
//! - Shallower levels that were never emitted are materialized at their start values.
//!
//! Unresolvable references never abort the run: the block keeps `format = none`
//! with an empty ordinal and a `numbering_resolution` diagnostic.

pub mod definitions;
pub mod format;

use std::collections::{HashMap, HashSet};

use tracing::{info, warn};

use crate::models::{Block, BlockType, Diagnostic, DiagnosticKind, ListMeta, NumberFormat};
use crate::models::list::list_instance_id;
use crate::parsing::{NumberingRef, RawBlock, RawKind};
pub use definitions::{
    AbstractNum, LevelDef, MAX_LEVELS, NumberingDefinitions, ResolvedLevel, RestartRule,
};

#[derive(Debug, Default)]
struct InstanceState {
    values: [Option<u32>; MAX_LEVELS],
    started: [bool; MAX_LEVELS],
    /// Bumped whenever the level's value is set or cleared.
    generations: [u64; MAX_LEVELS],
    /// Sum of the watched generations at the level's last emission.
    marks: [Option<u64>; MAX_LEVELS],
    seen: [HashSet<String>; MAX_LEVELS],
}

impl InstanceState {
    fn set(&mut self, level: usize, value: Option<u32>) {
        self.values[level] = value;
        self.generations[level] += 1;
    }

    fn watched_generation(&self, upto: usize) -> u64 {
        self.generations[..=upto].iter().sum()
    }
}

pub struct Numberer<'d> {
    defs: &'d NumberingDefinitions,
    states: HashMap<u32, InstanceState>,
}

impl<'d> Numberer<'d> {
    pub fn new(defs: &'d NumberingDefinitions) -> Self {
        Self {
            defs,
            states: HashMap::new(),
        }
    }

    /// Number one reference. Diagnostics describe demotions and duplicate ordinals.
    pub fn number(&mut self, reference: NumberingRef) -> (ListMeta, Option<Diagnostic>) {
        let NumberingRef { num_id, ilvl } = reference;
        let k = usize::from(ilvl);
        let defs = self.defs;

        let demote = |reason: String, abstract_id: Option<u32>| {
            let mut list = ListMeta::unresolved(num_id, ilvl);
            list.abstract_num_id = abstract_id;
            (
                list,
                Some(Diagnostic::new(DiagnosticKind::NumberingResolution, reason)),
            )
        };

        if k >= MAX_LEVELS {
            return demote(format!("list level {ilvl} is out of range"), None);
        }
        let Some(abstract_id) = defs.abstract_id(num_id) else {
            return demote(format!("unknown numbering instance {num_id}"), None);
        };
        let Some(level) = defs.level(num_id, ilvl) else {
            return demote(
                format!("numbering instance {num_id} has no level {ilvl}"),
                Some(abstract_id),
            );
        };
        if let Err(reason) = check_pattern(&level.def.pattern, k) {
            return demote(reason, Some(abstract_id));
        }

        let state = self.states.entry(num_id).or_default();

        for i in 0..k {
            if state.values[i].is_none() {
                let start = start_value(defs, num_id, i, state.started[i]);
                if !format::renderable(start, level_format(defs, num_id, i)) {
                    return demote(
                        format!("level {i} of numbering instance {num_id} starts at {start}"),
                        Some(abstract_id),
                    );
                }
            }
        }
        for i in 0..k {
            if state.values[i].is_none() {
                let start = start_value(defs, num_id, i, state.started[i]);
                state.set(i, Some(start));
                state.started[i] = true;
            }
        }

        if let RestartRule::AfterLevel(j) = level.def.restart
            && state.values[k].is_some()
            && state.marks[k] != Some(state.watched_generation(usize::from(j)))
        {
            state.set(k, None);
        }

        let restart_boundary = state.values[k].is_none();
        let next = match state.values[k] {
            Some(current) => current.checked_add(1),
            None => Some(start_value(defs, num_id, k, state.started[k])),
        };
        let Some(value) = next.filter(|&v| format::renderable(v, level.def.format)) else {
            return demote(
                format!(
                    "counter for level {ilvl} of numbering instance {num_id} is out of range (max {})",
                    format::MAX_COUNTER
                ),
                Some(abstract_id),
            );
        };
        state.set(k, Some(value));
        state.started[k] = true;
        state.marks[k] = match level.def.restart {
            RestartRule::AfterLevel(j) => Some(state.watched_generation(usize::from(j))),
            _ => None,
        };

        for deeper in k + 1..MAX_LEVELS {
            let rule = defs
                .level(num_id, deeper as u8)
                .map(|l| l.def.restart)
                .unwrap_or_default();
            if rule == RestartRule::Default && state.values[deeper].is_some() {
                state.set(deeper, None);
            }
        }

        let counters: Vec<u32> = state.values[..=k].iter().map(|v| v.unwrap_or(0)).collect();
        let ordinal = render_ordinal(defs, num_id, &level, &counters);

        if restart_boundary {
            state.seen[k].clear();
        }
        let duplicate = !ordinal.is_empty() && !state.seen[k].insert(ordinal.clone());

        let list = ListMeta {
            num_id,
            abstract_num_id: Some(abstract_id),
            level: ilvl,
            counters,
            ordinal,
            format: level.def.format,
            pattern: level.def.pattern.clone(),
            is_legal: level.def.is_legal,
            restart_boundary,
            list_instance_id: list_instance_id(num_id),
            numbering_digest: defs.digest(abstract_id).map(str::to_string),
        };
        let diagnostic = duplicate.then(|| {
            Diagnostic::new(
                DiagnosticKind::DuplicateOrdinal,
                format!(
                    "ordinal {:?} repeats within {} level {}",
                    list.ordinal, list.list_instance_id, ilvl
                ),
            )
        });
        (list, diagnostic)
    }
}

fn start_value(defs: &NumberingDefinitions, num_id: u32, level: usize, started: bool) -> u32 {
    match defs.level(num_id, level as u8) {
        Some(resolved) => match resolved.start_override {
            Some(start) if !started => start,
            _ => resolved.def.start,
        },
        None => 1,
    }
}

fn level_format(defs: &NumberingDefinitions, num_id: u32, level: usize) -> NumberFormat {
    defs.level(num_id, level as u8)
        .map(|l| l.def.format)
        .unwrap_or(NumberFormat::Decimal)
}

/// Placeholders `%1`..`%9` may only name this level or a shallower one.
fn check_pattern(pattern: &str, level: usize) -> Result<(), String> {
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '%'
            && let Some(digit) = chars.peek().and_then(|d| d.to_digit(10))
        {
            chars.next();
            if digit == 0 || digit as usize > level + 1 {
                return Err(format!(
                    "pattern {pattern:?} references level {digit} from level {}",
                    level + 1
                ));
            }
        }
    }
    Ok(())
}

fn render_ordinal(
    defs: &NumberingDefinitions,
    num_id: u32,
    level: &ResolvedLevel<'_>,
    counters: &[u32],
) -> String {
    let own = level.def.format;
    if matches!(own, NumberFormat::Bullet | NumberFormat::None) {
        return String::new();
    }
    let k = counters.len() - 1;
    let mut out = String::new();
    let mut chars = level.def.pattern.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '%'
            && let Some(digit) = chars.peek().and_then(|d| d.to_digit(10))
        {
            chars.next();
            let i = digit as usize - 1;
            let fmt = if i == k {
                own
            } else if level.def.is_legal {
                NumberFormat::Decimal
            } else {
                defs.level(num_id, i as u8)
                    .map(|l| l.def.format)
                    .unwrap_or(NumberFormat::Decimal)
            };
            out.push_str(&format::render(counters[i], fmt));
        } else {
            out.push(c);
        }
    }
    out.trim().to_string()
}

/// Number every block in document order and settle its final type.
pub fn apply_numbering(raw: Vec<RawBlock>, defs: &NumberingDefinitions) -> Vec<Block> {
    let mut numberer = Numberer::new(defs);
    let mut numbered = 0usize;
    let mut demoted = 0usize;

    let blocks: Vec<Block> = raw
        .into_iter()
        .map(|raw| {
            let mut diagnostics = raw.diagnostics;
            let list = raw.numbering.map(|reference| {
                let (list, diagnostic) = numberer.number(reference);
                if let Some(diagnostic) = diagnostic {
                    warn!(
                        para_id = %raw.para_id,
                        num_id = reference.num_id,
                        level = reference.ilvl,
                        kind = ?diagnostic.kind,
                        "{}",
                        diagnostic.message
                    );
                    if diagnostic.kind == DiagnosticKind::NumberingResolution {
                        demoted += 1;
                    }
                    diagnostics.push(diagnostic);
                }
                if list.is_labelled() {
                    numbered += 1;
                }
                list
            });

            let (block_type, level) = match raw.kind {
                RawKind::Table => (BlockType::Table, None),
                RawKind::Heading { level } => (BlockType::Heading, Some(level)),
                RawKind::Paragraph
                    if raw.list_style || list.as_ref().is_some_and(ListMeta::is_bullet) =>
                {
                    (BlockType::ListItem, None)
                }
                RawKind::Paragraph => (BlockType::Paragraph, None),
            };

            let id = block_id(&raw.para_id);
            Block {
                clause_group_id: id.clone(),
                id,
                block_type,
                text: raw.text,
                style: raw.style,
                style_id: raw.style_id,
                para_id: raw.para_id,
                indent: raw.indent,
                level,
                attachment_id: raw.attachment_id,
                list,
                parent_block_id: None,
                child_block_ids: Vec::new(),
                sibling_ordinal: 0,
                continuation_of: None,
                restart_group_id: None,
                diagnostics,
            }
        })
        .collect();

    info!(
        blocks = blocks.len(),
        numbered, demoted, "numbering resolved"
    );
    blocks
}

pub fn block_id(para_id: &str) -> String {
    format!("blk-{}", para_id.to_ascii_lowercase())
}
