//! # Parser
//!
//! Turns a `.docx` package into an ordered stream of [`RawBlock`]s.
//!
//! ## Parts
//!
//! - `word/document.xml` (required): the body that is walked.
//! - `word/numbering.xml` (optional): numbering definitions for the numberer.
//! - `word/styles.xml` (optional): style names, inheritance, heading levels.
//!
//! Any other collaborator that can produce a [`ParsedDocument`] can feed the
//! rest of the pipeline directly.

pub mod attachments;
mod body;
pub mod para_id;
pub mod styles;
pub(crate) mod xml;

use std::io::{Cursor, Read};

use roxmltree::Document;
use tracing::info;

use crate::error::AnalysisError;
use crate::models::{Attachment, Diagnostic};
use crate::numbering::NumberingDefinitions;
use body::BodyWalker;
pub use styles::StyleSheet;

const DOCUMENT_PART: &str = "word/document.xml";
const NUMBERING_PART: &str = "word/numbering.xml";
const STYLES_PART: &str = "word/styles.xml";

/// A paragraph's raw list reference (`w:numId`, `w:ilvl`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NumberingRef {
    pub num_id: u32,
    pub ilvl: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawKind {
    Paragraph,
    Heading { level: u8 },
    Table,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlock {
    pub kind: RawKind,
    pub text: String,
    pub style: String,
    pub style_id: Option<String>,
    pub para_id: String,
    pub indent: i64,
    pub numbering: Option<NumberingRef>,
    /// Styled as a list paragraph (`List Paragraph`, `List Number 2`, ...).
    pub list_style: bool,
    pub attachment_id: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl RawBlock {
    pub fn paragraph(text: impl Into<String>, para_id: impl Into<String>) -> Self {
        Self {
            kind: RawKind::Paragraph,
            text: text.into(),
            style: "Normal".to_string(),
            style_id: Some("Normal".to_string()),
            para_id: para_id.into(),
            indent: 0,
            numbering: None,
            list_style: false,
            attachment_id: None,
            diagnostics: Vec::new(),
        }
    }

    pub fn heading(text: impl Into<String>, level: u8, para_id: impl Into<String>) -> Self {
        let level = level.clamp(1, 6);
        Self {
            kind: RawKind::Heading { level },
            style: format!("Heading {level}"),
            style_id: Some(format!("Heading{level}")),
            ..Self::paragraph(text, para_id)
        }
    }

    pub fn table(text: impl Into<String>, para_id: impl Into<String>) -> Self {
        Self {
            kind: RawKind::Table,
            style: "Table".to_string(),
            style_id: None,
            ..Self::paragraph(text, para_id)
        }
    }

    pub fn numbered(mut self, num_id: u32, ilvl: u8) -> Self {
        self.numbering = Some(NumberingRef { num_id, ilvl });
        self
    }

    pub fn with_style(mut self, style_id: impl Into<String>, style: impl Into<String>) -> Self {
        self.style_id = Some(style_id.into());
        self.style = style.into();
        self.list_style = self.style.to_ascii_lowercase().starts_with("list");
        self
    }

    pub fn with_indent(mut self, indent: i64) -> Self {
        self.indent = indent;
        self
    }

    pub fn in_attachment(mut self, attachment_id: impl Into<String>) -> Self {
        self.attachment_id = Some(attachment_id.into());
        self
    }
}

/// Parser output: the block stream plus what later stages need to interpret it.
#[derive(Debug, Clone, Default)]
pub struct ParsedDocument {
    pub blocks: Vec<RawBlock>,
    pub numbering: NumberingDefinitions,
    pub attachments: Vec<Attachment>,
}

/// Parse a `.docx` package held in memory.
pub fn parse_docx(bytes: &[u8]) -> Result<ParsedDocument, AnalysisError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| AnalysisError::InvalidInputDocument(format!("not a .docx package: {e}")))?;

    let document = read_part(&mut archive, DOCUMENT_PART)?.ok_or_else(|| {
        AnalysisError::InvalidInputDocument(format!("missing required part {DOCUMENT_PART}"))
    })?;
    let numbering = read_part(&mut archive, NUMBERING_PART)?;
    let styles = read_part(&mut archive, STYLES_PART)?;

    parse_parts(&document, numbering.as_deref(), styles.as_deref())
}

/// Parse already-extracted XML parts.
pub fn parse_parts(
    document_xml: &str,
    numbering_xml: Option<&str>,
    styles_xml: Option<&str>,
) -> Result<ParsedDocument, AnalysisError> {
    let numbering = numbering_xml
        .map(NumberingDefinitions::parse)
        .transpose()?
        .unwrap_or_default();
    let styles = styles_xml.map(StyleSheet::parse).transpose()?.unwrap_or_default();

    let doc = Document::parse(document_xml)
        .map_err(|e| AnalysisError::InvalidInputDocument(format!("{DOCUMENT_PART}: {e}")))?;
    let body = xml::child(doc.root_element(), "body").ok_or_else(|| {
        AnalysisError::InvalidInputDocument(format!("{DOCUMENT_PART} has no w:body"))
    })?;

    let mut walker = BodyWalker::new(&styles, &numbering, body);
    walker.walk(body);
    let BodyWalker {
        blocks,
        attachments,
        ..
    } = walker;

    info!(
        blocks = blocks.len(),
        attachments = attachments.len(),
        "document parsed"
    );
    Ok(ParsedDocument {
        blocks,
        numbering,
        attachments,
    })
}

fn read_part(
    archive: &mut zip::ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<Option<String>, AnalysisError> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => {
            return Err(AnalysisError::InvalidInputDocument(format!("{name}: {e}")));
        }
    };
    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| AnalysisError::InvalidInputDocument(format!("{name}: {e}")))?;
    Ok(Some(content))
}
