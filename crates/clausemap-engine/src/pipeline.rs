//! # Pipeline driver
//!
//! Parse → Number → Hierarchy → Sectionize → Relate → Emit, in strict
//! document order. Each run owns all of its state; nothing carries over
//! between documents.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use clausemap_config::AnalysisConfig;
use tracing::{info, warn};

use crate::error::AnalysisError;
use crate::hierarchy::HierarchyInferrer;
use crate::invariants;
use crate::io::{sha256_hex, write_artifacts};
use crate::models::{Analysis, Block, Manifest, SourceInfo, StyleUsage};
use crate::numbering::apply_numbering;
use crate::parsing::{ParsedDocument, parse_docx};
use crate::relationships::build_relationships;
use crate::sections::build_sections;

/// Analysis of a document plus the bytes it came from, ready for emission.
#[derive(Debug, Clone)]
pub struct AnalyzedDocument {
    pub analysis: Analysis,
    raw: Vec<u8>,
}

impl AnalyzedDocument {
    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw
    }
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    config: AnalysisConfig,
}

impl Pipeline {
    pub fn new(config: AnalysisConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze a `.docx` held in memory. Without an explicit `doc_id` the id is
    /// derived from the content hash, so identical input yields identical output.
    pub fn analyze_bytes(
        &self,
        bytes: &[u8],
        doc_id: Option<&str>,
    ) -> Result<AnalyzedDocument, AnalysisError> {
        let digest = sha256_hex(bytes);
        let doc_id = doc_id
            .map(str::to_string)
            .unwrap_or_else(|| default_doc_id(&digest));

        let parsed = parse_docx(bytes)?;
        let mut analysis = self.analyze_parsed(&doc_id, parsed);
        analysis.source = Some(SourceInfo {
            file_name: None,
            sha256: digest,
        });

        Ok(AnalyzedDocument {
            analysis,
            raw: bytes.to_vec(),
        })
    }

    pub fn analyze_file(&self, path: &Path) -> Result<AnalyzedDocument, AnalysisError> {
        let bytes = fs::read(path).map_err(|e| AnalysisError::io(path, e))?;
        let mut document = self.analyze_bytes(&bytes, None)?;
        if let Some(source) = document.analysis.source.as_mut() {
            source.file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned());
        }
        Ok(document)
    }

    /// Run every stage after parsing. Infallible: anomalies become diagnostics.
    pub fn analyze_parsed(&self, doc_id: &str, parsed: ParsedDocument) -> Analysis {
        let ParsedDocument {
            blocks: raw,
            numbering,
            attachments,
        } = parsed;

        let mut blocks = apply_numbering(raw, &numbering);
        HierarchyInferrer::new(&self.config).infer(&mut blocks);
        let sections = build_sections(doc_id, &blocks);
        let relationships = build_relationships(&blocks);
        let styles = style_usage(&blocks);

        let analysis = Analysis {
            doc_id: doc_id.to_string(),
            blocks,
            sections,
            relationships,
            styles,
            attachments,
            source: None,
        };

        let violations = invariants::check_with_window(&analysis, self.config.continuation_window);
        for violation in &violations {
            warn!(doc_id, %violation, "structural invariant violated");
        }
        info!(
            doc_id,
            blocks = analysis.blocks.len(),
            sections = analysis.section_count(),
            attachments = analysis.attachments.len(),
            violations = violations.len(),
            "analysis complete"
        );
        analysis
    }

    /// Emit the artifact set, including `raw.docx` when configured.
    pub fn write(&self, document: &AnalyzedDocument, out_dir: &Path) -> Result<Manifest, AnalysisError> {
        let raw = self.config.emit_raw_copy.then_some(document.raw_bytes());
        write_artifacts(&document.analysis, out_dir, raw)
    }

    pub fn run(&self, input: &Path, out_dir: &Path) -> Result<Manifest, AnalysisError> {
        let document = self.analyze_file(input)?;
        self.write(&document, out_dir)
    }
}

pub fn default_doc_id(sha256_hex: &str) -> String {
    format!("doc-{}", &sha256_hex[..16.min(sha256_hex.len())])
}

/// Per-style block counts, most used first.
fn style_usage(blocks: &[Block]) -> Vec<StyleUsage> {
    let mut counts: HashMap<(Option<&str>, &str), usize> = HashMap::new();
    for block in blocks {
        *counts
            .entry((block.style_id.as_deref(), block.style.as_str()))
            .or_default() += 1;
    }

    let mut styles: Vec<StyleUsage> = counts
        .into_iter()
        .map(|((style_id, style_name), count)| StyleUsage {
            style_id: style_id.map(str::to_string),
            style_name: style_name.to_string(),
            count,
        })
        .collect();
    styles.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.style_id.cmp(&b.style_id))
            .then_with(|| a.style_name.cmp(&b.style_name))
    });
    styles
}
