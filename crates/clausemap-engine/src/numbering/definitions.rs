//! Numbering definitions from `word/numbering.xml`.
//!
//! ## Model
//!
//! - `w:abstractNum` holds up to nine level definitions (format, template, start, restart rule).
//! - `w:num` is a concrete instance pointing at one abstract definition, optionally
//!   overriding start values or whole levels.
//!
//! Paragraphs reference instances (`numId`), never abstract definitions.

use std::collections::{BTreeMap, HashMap};

use roxmltree::{Document, Node};
use sha2::{Digest, Sha256};

use crate::error::AnalysisError;
use crate::models::NumberFormat;
use crate::parsing::xml::{attr, child, child_val, children, indent_left, on_off, parse_num};

/// Word supports levels 0 through 8.
pub const MAX_LEVELS: usize = 9;

/// When a level's counter starts over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestartRule {
    /// Restarts whenever any shallower level is emitted.
    #[default]
    Default,
    /// Never restarts (`w:lvlRestart = 0`).
    Never,
    /// Restarts when the counter of this 0-based level changed since the last emission.
    AfterLevel(u8),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelDef {
    pub ilvl: u8,
    pub start: u32,
    pub format: NumberFormat,
    pub pattern: String,
    pub restart: RestartRule,
    pub is_legal: bool,
    pub p_style: Option<String>,
    pub indent_left: Option<i64>,
}

impl LevelDef {
    pub fn new(ilvl: u8, format: NumberFormat, pattern: impl Into<String>) -> Self {
        Self {
            ilvl,
            start: 1,
            format,
            pattern: pattern.into(),
            restart: RestartRule::Default,
            is_legal: false,
            p_style: None,
            indent_left: None,
        }
    }

    pub fn with_start(mut self, start: u32) -> Self {
        self.start = start;
        self
    }

    pub fn with_restart(mut self, restart: RestartRule) -> Self {
        self.restart = restart;
        self
    }

    pub fn legal(mut self) -> Self {
        self.is_legal = true;
        self
    }

    pub fn with_indent(mut self, left: i64) -> Self {
        self.indent_left = Some(left);
        self
    }

    fn parse(node: Node<'_, '_>) -> Option<Self> {
        let ilvl = parse_num::<u8>(attr(node, "ilvl")).filter(|l| usize::from(*l) < MAX_LEVELS)?;
        let restart = match parse_num::<u8>(child_val(node, "lvlRestart")) {
            None => RestartRule::Default,
            Some(0) => RestartRule::Never,
            // A rule pointing at this level or deeper cannot fire; keep the default.
            Some(j) if j <= ilvl => RestartRule::AfterLevel(j - 1),
            Some(_) => RestartRule::Default,
        };
        Some(Self {
            ilvl,
            start: parse_num(child_val(node, "start")).unwrap_or(0),
            format: child_val(node, "numFmt")
                .map(NumberFormat::from_ooxml)
                .unwrap_or(NumberFormat::Decimal),
            pattern: child_val(node, "lvlText").unwrap_or_default().to_string(),
            restart,
            is_legal: child(node, "isLgl").is_some_and(on_off),
            p_style: child_val(node, "pStyle").map(str::to_string),
            indent_left: child(node, "pPr").and_then(indent_left),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbstractNum {
    pub id: u32,
    pub levels: BTreeMap<u8, LevelDef>,
}

impl AbstractNum {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            levels: BTreeMap::new(),
        }
    }

    pub fn with_level(mut self, level: LevelDef) -> Self {
        self.levels.insert(level.ilvl, level);
        self
    }

    /// First 16 hex digits of a sha256 over the per-level `(format, pattern, start)` tuples.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for level in self.levels.values() {
            hasher.update(
                format!(
                    "{}:{}:{}:{};",
                    level.ilvl,
                    level.format.as_str(),
                    level.pattern,
                    level.start
                )
                .as_bytes(),
            );
        }
        let hex = format!("{:x}", hasher.finalize());
        hex[..16].to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumInstance {
    pub num_id: u32,
    pub abstract_id: u32,
    pub start_overrides: HashMap<u8, u32>,
    pub level_overrides: HashMap<u8, LevelDef>,
}

/// A level as seen through a concrete instance, overrides applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLevel<'a> {
    pub abstract_id: u32,
    pub def: &'a LevelDef,
    pub start_override: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct NumberingDefinitions {
    abstracts: HashMap<u32, AbstractNum>,
    instances: HashMap<u32, NumInstance>,
    digests: HashMap<u32, String>,
}

impl NumberingDefinitions {
    pub fn parse(xml: &str) -> Result<Self, AnalysisError> {
        let doc = Document::parse(xml)
            .map_err(|e| AnalysisError::InvalidInputDocument(format!("numbering.xml: {e}")))?;
        let root = doc.root_element();

        let mut defs = Self::default();
        let mut parsed = Vec::new();
        let mut style_definitions: HashMap<&str, BTreeMap<u8, LevelDef>> = HashMap::new();
        for node in children(root, "abstractNum") {
            let Some(id) = parse_num::<u32>(attr(node, "abstractNumId")) else {
                continue;
            };
            let mut abstract_num = AbstractNum::new(id);
            for level in children(node, "lvl").filter_map(LevelDef::parse) {
                abstract_num.levels.insert(level.ilvl, level);
            }
            if let Some(style) = child_val(node, "styleLink")
                && !abstract_num.levels.is_empty()
            {
                style_definitions
                    .entry(style)
                    .or_insert_with(|| abstract_num.levels.clone());
            }
            parsed.push((abstract_num, child_val(node, "numStyleLink")));
        }

        // A list that only links to a numbering style borrows the levels of the
        // definition that declares that style.
        for (mut abstract_num, link) in parsed {
            if abstract_num.levels.is_empty()
                && let Some(levels) = link.and_then(|style| style_definitions.get(style))
            {
                abstract_num.levels = levels.clone();
            }
            defs.add_abstract(abstract_num);
        }

        for node in children(root, "num") {
            let (Some(num_id), Some(abstract_id)) = (
                parse_num::<u32>(attr(node, "numId")),
                parse_num::<u32>(child_val(node, "abstractNumId")),
            ) else {
                continue;
            };
            let mut instance = NumInstance {
                num_id,
                abstract_id,
                start_overrides: HashMap::new(),
                level_overrides: HashMap::new(),
            };
            for over in children(node, "lvlOverride") {
                let Some(ilvl) = parse_num::<u8>(attr(over, "ilvl")) else {
                    continue;
                };
                if let Some(start) = parse_num::<u32>(child_val(over, "startOverride")) {
                    instance.start_overrides.insert(ilvl, start);
                }
                if let Some(level) = child(over, "lvl").and_then(LevelDef::parse) {
                    instance.level_overrides.insert(ilvl, LevelDef { ilvl, ..level });
                }
            }
            defs.instances.insert(num_id, instance);
        }
        Ok(defs)
    }

    pub fn add_abstract(&mut self, abstract_num: AbstractNum) {
        self.digests.insert(abstract_num.id, abstract_num.digest());
        self.abstracts.insert(abstract_num.id, abstract_num);
    }

    pub fn add_instance(&mut self, num_id: u32, abstract_id: u32) {
        self.instances.insert(
            num_id,
            NumInstance {
                num_id,
                abstract_id,
                start_overrides: HashMap::new(),
                level_overrides: HashMap::new(),
            },
        );
    }

    pub fn instance_mut(&mut self, num_id: u32) -> Option<&mut NumInstance> {
        self.instances.get_mut(&num_id)
    }

    /// Abstract definition id of an instance, if both exist.
    pub fn abstract_id(&self, num_id: u32) -> Option<u32> {
        let instance = self.instances.get(&num_id)?;
        self.abstracts
            .contains_key(&instance.abstract_id)
            .then_some(instance.abstract_id)
    }

    pub fn digest(&self, abstract_id: u32) -> Option<&str> {
        self.digests.get(&abstract_id).map(String::as_str)
    }

    pub fn level(&self, num_id: u32, ilvl: u8) -> Option<ResolvedLevel<'_>> {
        let instance = self.instances.get(&num_id)?;
        let def = match instance.level_overrides.get(&ilvl) {
            Some(def) => def,
            None => self.abstracts.get(&instance.abstract_id)?.levels.get(&ilvl)?,
        };
        Some(ResolvedLevel {
            abstract_id: instance.abstract_id,
            def,
            start_override: instance.start_overrides.get(&ilvl).copied(),
        })
    }

    /// The level of an instance whose `w:pStyle` names the given style.
    pub fn level_for_style(&self, num_id: u32, style_id: &str) -> Option<u8> {
        let instance = self.instances.get(&num_id)?;
        let abstract_num = self.abstracts.get(&instance.abstract_id)?;
        abstract_num
            .levels
            .values()
            .find(|level| level.p_style.as_deref() == Some(style_id))
            .map(|level| level.ilvl)
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
