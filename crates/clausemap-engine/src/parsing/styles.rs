use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;
use roxmltree::{Document, Node};

use super::xml::{attr, child, child_val, children, indent_left, parse_num};
use crate::error::AnalysisError;

fn heading_name_regex() -> &'static Regex {
    static HEADING_NAME: OnceLock<Regex> = OnceLock::new();
    HEADING_NAME
        .get_or_init(|| Regex::new(r"(?i)^heading\s*([1-9])$").expect("Invalid heading regex"))
}

/// Numbering reference declared by a paragraph style (`w:pPr/w:numPr`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleNumRef {
    pub num_id: u32,
    pub ilvl: Option<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct StyleDef {
    pub id: String,
    pub name: Option<String>,
    pub based_on: Option<String>,
    pub outline_level: Option<u8>,
    pub num_ref: Option<StyleNumRef>,
    pub indent_left: Option<i64>,
}

/// Paragraph and table styles from `word/styles.xml`.
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    styles: HashMap<String, StyleDef>,
    default_paragraph: Option<String>,
}

impl StyleSheet {
    pub fn parse(xml: &str) -> Result<Self, AnalysisError> {
        let doc = Document::parse(xml)
            .map_err(|e| AnalysisError::InvalidInputDocument(format!("styles.xml: {e}")))?;

        let mut sheet = Self::default();
        for node in children(doc.root_element(), "style") {
            let Some(id) = attr(node, "styleId") else {
                continue;
            };
            let def = parse_style(node, id);
            if attr(node, "type") == Some("paragraph") && attr(node, "default") == Some("1") {
                sheet.default_paragraph = Some(id.to_string());
            }
            sheet.styles.insert(id.to_string(), def);
        }
        Ok(sheet)
    }

    pub fn insert(&mut self, def: StyleDef) {
        self.styles.insert(def.id.clone(), def);
    }

    pub fn default_paragraph_style(&self) -> Option<&str> {
        self.default_paragraph.as_deref()
    }

    /// Human-readable style name, falling back to the id.
    pub fn display_name(&self, id: &str) -> String {
        self.styles
            .get(id)
            .and_then(|s| s.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Heading level implied by the style name (`Heading N`, `Title`).
    pub fn heading_level_by_name(&self, id: &str) -> Option<u8> {
        let name = self.display_name(id);
        if name.eq_ignore_ascii_case("title") {
            return Some(1);
        }
        heading_name_regex()
            .captures(name.trim())
            .and_then(|c| c[1].parse::<u8>().ok())
            .map(|level| level.min(6))
    }

    pub fn outline_level(&self, id: &str) -> Option<u8> {
        self.inherited(id, |s| s.outline_level)
    }

    pub fn num_ref(&self, id: &str) -> Option<StyleNumRef> {
        self.inherited(id, |s| s.num_ref)
    }

    pub fn indent_left(&self, id: &str) -> Option<i64> {
        self.inherited(id, |s| s.indent_left)
    }

    /// Walks the `basedOn` chain until `pick` yields a value. Cycles end the walk.
    fn inherited<T>(&self, id: &str, pick: impl Fn(&StyleDef) -> Option<T>) -> Option<T> {
        let mut visited = HashSet::new();
        let mut current = Some(id);
        while let Some(style_id) = current {
            if !visited.insert(style_id) {
                break;
            }
            let style = self.styles.get(style_id)?;
            if let Some(value) = pick(style) {
                return Some(value);
            }
            current = style.based_on.as_deref();
        }
        None
    }
}

fn parse_style(node: Node<'_, '_>, id: &str) -> StyleDef {
    let mut def = StyleDef {
        id: id.to_string(),
        name: child_val(node, "name").map(str::to_string),
        based_on: child_val(node, "basedOn").map(str::to_string),
        ..StyleDef::default()
    };

    if let Some(ppr) = child(node, "pPr") {
        // Level 9 is "body text", i.e. no outline level.
        def.outline_level = parse_num::<u8>(child_val(ppr, "outlineLvl")).filter(|l| *l < 9);
        def.indent_left = indent_left(ppr);
        if let Some(num_pr) = child(ppr, "numPr")
            && let Some(num_id) = parse_num::<u32>(child_val(num_pr, "numId"))
        {
            def.num_ref = Some(StyleNumRef {
                num_id,
                ilvl: parse_num(child_val(num_pr, "ilvl")),
            });
        }
    }
    def
}
