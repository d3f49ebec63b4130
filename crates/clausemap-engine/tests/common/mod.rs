//! Shared helpers for integration tests: in-memory `.docx` packages and log setup.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::sync::Once;

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const W14_NS: &str = "http://schemas.microsoft.com/office/word/2010/wordml";

pub const STYLES: &str = r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>
  <w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:pPr><w:outlineLvl w:val="0"/></w:pPr></w:style>
  <w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:pPr><w:outlineLvl w:val="1"/></w:pPr></w:style>
  <w:style w:type="paragraph" w:styleId="ScheduleTitle"><w:name w:val="Schedule Title"/></w:style>
</w:styles>"#;

/// Instances 1 and 2 share `1.` / `1.1` / `1.1.1`; instance 3 is `1.` / `(a)`;
/// instance 4 has an unlabelled second level; instance 5 starts at 3.
pub const NUMBERING: &str = r#"<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:abstractNum w:abstractNumId="0">
    <w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="decimal"/><w:lvlText w:val="%1."/></w:lvl>
    <w:lvl w:ilvl="1"><w:start w:val="1"/><w:numFmt w:val="decimal"/><w:lvlText w:val="%1.%2"/></w:lvl>
    <w:lvl w:ilvl="2"><w:start w:val="1"/><w:numFmt w:val="decimal"/><w:lvlText w:val="%1.%2.%3"/></w:lvl>
  </w:abstractNum>
  <w:abstractNum w:abstractNumId="1">
    <w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="decimal"/><w:lvlText w:val="%1."/></w:lvl>
    <w:lvl w:ilvl="1"><w:start w:val="1"/><w:numFmt w:val="lowerLetter"/><w:lvlText w:val="(%2)"/></w:lvl>
  </w:abstractNum>
  <w:abstractNum w:abstractNumId="2">
    <w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="decimal"/><w:lvlText w:val="%1."/></w:lvl>
    <w:lvl w:ilvl="1"><w:start w:val="1"/><w:numFmt w:val="none"/><w:lvlText w:val=""/></w:lvl>
  </w:abstractNum>
  <w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num>
  <w:num w:numId="2"><w:abstractNumId w:val="0"/></w:num>
  <w:num w:numId="3"><w:abstractNumId w:val="1"/></w:num>
  <w:num w:numId="4"><w:abstractNumId w:val="2"/></w:num>
  <w:num w:numId="5">
    <w:abstractNumId w:val="0"/>
    <w:lvlOverride w:ilvl="0"><w:startOverride w:val="3"/></w:lvlOverride>
  </w:num>
</w:numbering>"#;

/// Builds a minimal `.docx` package paragraph by paragraph.
#[derive(Debug, Clone)]
pub struct DocxBuilder {
    body: String,
    next_para_id: u32,
    numbering: Option<String>,
    styles: Option<String>,
}

impl Default for DocxBuilder {
    fn default() -> Self {
        Self {
            body: String::new(),
            next_para_id: 0x1000_0001,
            numbering: Some(NUMBERING.to_string()),
            styles: Some(STYLES.to_string()),
        }
    }
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_numbering(mut self) -> Self {
        self.numbering = None;
        self
    }

    pub fn without_styles(mut self) -> Self {
        self.styles = None;
        self
    }

    pub fn paragraph(self, text: &str) -> Self {
        self.raw_paragraph("", text)
    }

    pub fn indented(self, text: &str, left: i64) -> Self {
        self.raw_paragraph(&format!(r#"<w:ind w:left="{left}"/>"#), text)
    }

    pub fn styled(self, style_id: &str, text: &str) -> Self {
        self.raw_paragraph(&format!(r#"<w:pStyle w:val="{style_id}"/>"#), text)
    }

    pub fn heading(self, level: u8, text: &str) -> Self {
        self.styled(&format!("Heading{level}"), text)
    }

    pub fn numbered(self, num_id: u32, ilvl: u8, text: &str) -> Self {
        self.raw_paragraph(
            &format!(r#"<w:numPr><w:ilvl w:val="{ilvl}"/><w:numId w:val="{num_id}"/></w:numPr>"#),
            text,
        )
    }

    pub fn table(mut self, rows: &[&[&str]]) -> Self {
        self.body.push_str("<w:tbl>");
        for row in rows {
            self.body.push_str("<w:tr>");
            for cell in *row {
                self.body.push_str(&format!(
                    "<w:tc><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:tc>",
                    escape(cell)
                ));
            }
            self.body.push_str("</w:tr>");
        }
        self.body.push_str("</w:tbl>");
        self
    }

    fn raw_paragraph(mut self, ppr: &str, text: &str) -> Self {
        let para_id = self.next_para_id;
        self.next_para_id += 1;
        self.body.push_str(&format!(
            r#"<w:p w14:paraId="{para_id:08X}"><w:pPr>{ppr}</w:pPr><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
            escape(text)
        ));
        self
    }

    pub fn document_xml(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{W_NS}" xmlns:w14="{W14_NS}"><w:body>{}</w:body></w:document>"#,
            self.body
        )
    }

    pub fn build(&self) -> Vec<u8> {
        let mut parts = vec![("word/document.xml", self.document_xml())];
        if let Some(numbering) = &self.numbering {
            parts.push(("word/numbering.xml", numbering.clone()));
        }
        if let Some(styles) = &self.styles {
            parts.push(("word/styles.xml", styles.clone()));
        }
        zip_parts(&parts)
    }
}

pub fn zip_parts(parts: &[(&str, String)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, content) in parts {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

static INIT: Once = Once::new();

/// Route `tracing` output through the test harness. `RUST_LOG` controls the level.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
