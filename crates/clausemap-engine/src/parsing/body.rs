use roxmltree::Node;
use tracing::{debug, warn};

use super::attachments::AttachmentDetector;
use super::para_id::{ParaIdAllocator, ParaIdClaim};
use super::styles::StyleSheet;
use super::xml::{MC_NS, W_NS, W14_NS, child, child_val, indent_left, is_w, parse_num};
use super::{NumberingRef, RawBlock, RawKind};
use crate::models::{Attachment, Diagnostic, DiagnosticKind};
use crate::numbering::NumberingDefinitions;

/// Walks `w:body` in document order, emitting one raw block per non-empty
/// paragraph and one per top-level table.
pub(crate) struct BodyWalker<'a> {
    styles: &'a StyleSheet,
    numbering: &'a NumberingDefinitions,
    detector: AttachmentDetector,
    para_ids: ParaIdAllocator,
    current_attachment: Option<String>,
    position: usize,
    pub(crate) blocks: Vec<RawBlock>,
    pub(crate) attachments: Vec<Attachment>,
}

impl<'a> BodyWalker<'a> {
    pub(crate) fn new(
        styles: &'a StyleSheet,
        numbering: &'a NumberingDefinitions,
        body: Node<'_, '_>,
    ) -> Self {
        let native_ids = body
            .descendants()
            .filter(|n| is_w(*n, "p"))
            .filter_map(|n| n.attribute((W14_NS, "paraId")));
        Self {
            styles,
            numbering,
            detector: AttachmentDetector::default(),
            para_ids: ParaIdAllocator::with_reserved(native_ids),
            current_attachment: None,
            position: 0,
            blocks: Vec::new(),
            attachments: Vec::new(),
        }
    }

    pub(crate) fn walk(&mut self, container: Node<'_, '_>) {
        for node in container.children().filter(Node::is_element) {
            if is_w(node, "p") {
                self.push_paragraph(node);
            } else if is_w(node, "tbl") {
                self.push_table(node);
            } else if is_w(node, "sdt") {
                if let Some(content) = child(node, "sdtContent") {
                    self.walk(content);
                }
            } else if is_w(node, "customXml")
                || node.tag_name().namespace() == Some(MC_NS) && node.tag_name().name() == "AlternateContent"
            {
                self.walk_first_choice(node);
            }
        }
    }

    fn walk_first_choice(&mut self, node: Node<'_, '_>) {
        if node.tag_name().name() == "AlternateContent" {
            if let Some(choice) = node.children().find(|c| c.is_element()) {
                self.walk(choice);
            }
        } else {
            self.walk(node);
        }
    }

    fn push_paragraph(&mut self, p: Node<'_, '_>) {
        let ppr = child(p, "pPr");
        let style_id = ppr
            .and_then(|ppr| child_val(ppr, "pStyle"))
            .map(str::to_string)
            .or_else(|| self.styles.default_paragraph_style().map(str::to_string));
        let style = style_id
            .as_deref()
            .map(|id| self.styles.display_name(id))
            .unwrap_or_else(|| "Normal".to_string());

        let numbering = self.numbering_ref(ppr, style_id.as_deref());
        let text = paragraph_text(p);
        if text.trim().is_empty() && numbering.is_none() {
            return;
        }

        let position = self.next_position();
        let claim = self
            .para_ids
            .claim(p.attribute((W14_NS, "paraId")), position, &text);
        let mut diagnostics = Vec::new();
        if let ParaIdClaim::Duplicate { native, assigned } = &claim {
            warn!(native = %native, assigned = %assigned, "duplicate paragraph id");
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::DuplicateParaId,
                format!("paragraph id {native} already used; assigned {assigned}"),
            ));
        }

        let mut kind = match self.heading_level(ppr, style_id.as_deref(), numbering.is_some()) {
            Some(level) => RawKind::Heading { level },
            None => RawKind::Paragraph,
        };

        if let Some(attachment) = self.detector.detect(&style, &text, numbering.is_some()) {
            debug!(attachment = %attachment.attachment_id, label = %attachment.label, "attachment marker");
            self.current_attachment = Some(attachment.attachment_id.clone());
            self.attachments.push(attachment);
            kind = RawKind::Heading { level: 1 };
        }

        let indent = ppr
            .and_then(indent_left)
            .or_else(|| {
                numbering.and_then(|r| {
                    self.numbering
                        .level(r.num_id, r.ilvl)
                        .and_then(|l| l.def.indent_left)
                })
            })
            .or_else(|| style_id.as_deref().and_then(|id| self.styles.indent_left(id)))
            .unwrap_or(0);

        let list_style = style.to_ascii_lowercase().starts_with("list");
        self.blocks.push(RawBlock {
            kind,
            text: text.trim().to_string(),
            style,
            style_id,
            para_id: claim.id().to_string(),
            indent,
            numbering,
            list_style,
            attachment_id: self.current_attachment.clone(),
            diagnostics,
        });
    }

    fn push_table(&mut self, tbl: Node<'_, '_>) {
        let text = table_text(tbl);
        let style_id = child(tbl, "tblPr")
            .and_then(|pr| child_val(pr, "tblStyle"))
            .map(str::to_string);
        let style = style_id
            .as_deref()
            .map(|id| self.styles.display_name(id))
            .unwrap_or_else(|| "Table".to_string());

        let position = self.next_position();
        let claim = self.para_ids.claim(None, position, &text);
        self.blocks.push(RawBlock {
            kind: RawKind::Table,
            text,
            style,
            style_id,
            para_id: claim.id().to_string(),
            indent: 0,
            numbering: None,
            list_style: false,
            attachment_id: self.current_attachment.clone(),
            diagnostics: Vec::new(),
        });
    }

    fn next_position(&mut self) -> usize {
        let position = self.position;
        self.position += 1;
        position
    }

    /// Direct `w:numPr` wins over the style's; `numId = 0` switches numbering off.
    fn numbering_ref(&self, ppr: Option<Node<'_, '_>>, style_id: Option<&str>) -> Option<NumberingRef> {
        let direct = ppr.and_then(|ppr| child(ppr, "numPr"));
        let direct_num = direct.and_then(|n| parse_num::<u32>(child_val(n, "numId")));
        let direct_ilvl = direct.and_then(|n| parse_num::<u8>(child_val(n, "ilvl")));

        let style_ref = style_id.and_then(|id| self.styles.num_ref(id));
        let num_id = direct_num.or(style_ref.map(|r| r.num_id))?;
        if num_id == 0 {
            return None;
        }

        let ilvl = direct_ilvl
            .or_else(|| style_ref.filter(|r| r.num_id == num_id).and_then(|r| r.ilvl))
            .or_else(|| style_id.and_then(|id| self.numbering.level_for_style(num_id, id)))
            .unwrap_or(0);
        Some(NumberingRef { num_id, ilvl })
    }

    /// Style names (`Heading N`, `Title`) always mark headings; outline levels only
    /// do so for paragraphs outside a numbered list.
    fn heading_level(&self, ppr: Option<Node<'_, '_>>, style_id: Option<&str>, numbered: bool) -> Option<u8> {
        if let Some(level) = style_id.and_then(|id| self.styles.heading_level_by_name(id)) {
            return Some(level);
        }
        if numbered {
            return None;
        }
        ppr.and_then(|ppr| parse_num::<u8>(child_val(ppr, "outlineLvl")))
            .filter(|l| *l < 9)
            .or_else(|| style_id.and_then(|id| self.styles.outline_level(id)))
            .map(|l| (l + 1).min(6))
    }
}

/// Visible text of a paragraph, tracked insertions included and deletions skipped.
pub(crate) fn paragraph_text(p: Node<'_, '_>) -> String {
    let mut out = String::new();
    collect_text(p, &mut out);
    out
}

fn collect_text(node: Node<'_, '_>, out: &mut String) {
    for c in node.children().filter(Node::is_element) {
        let tag = c.tag_name();
        match (tag.namespace(), tag.name()) {
            (Some(MC_NS), "Fallback") => {}
            (Some(W_NS), name) => match name {
                "t" => out.push_str(c.text().unwrap_or_default()),
                "tab" => out.push('\t'),
                "br" | "cr" => out.push('\n'),
                "noBreakHyphen" => out.push('-'),
                "pPr" | "rPr" | "del" | "delText" | "instrText" | "txbxContent" | "moveFrom" => {}
                _ => collect_text(c, out),
            },
            _ => collect_text(c, out),
        }
    }
}

/// Cells joined by ` | `, rows by newlines.
pub(crate) fn table_text(tbl: Node<'_, '_>) -> String {
    tbl.children()
        .filter(|n| is_w(*n, "tr"))
        .map(|tr| {
            tr.children()
                .filter(|n| is_w(*n, "tc"))
                .map(cell_text)
                .collect::<Vec<_>>()
                .join(" | ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn cell_text(tc: Node<'_, '_>) -> String {
    let mut parts = Vec::new();
    for c in tc.children().filter(Node::is_element) {
        if is_w(c, "p") {
            parts.push(paragraph_text(c).trim().to_string());
        } else if is_w(c, "tbl") {
            parts.push(table_text(c).replace('\n', " "));
        } else if is_w(c, "sdt")
            && let Some(content) = child(c, "sdtContent")
        {
            parts.push(cell_text(content));
        }
    }
    parts.retain(|p| !p.is_empty());
    parts.join(" ")
}
