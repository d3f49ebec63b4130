//! # Artifact loader
//!
//! Reads an emitted analysis directory into memory and answers structural
//! queries. Construction is the only fallible step; once built the loader is
//! immutable, every query is total, and a miss is `None` or an empty `Vec`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use super::query::{DocumentStats, SearchQuery};
use super::{
    BLOCKS_FILE, INDEX_FILE, MANIFEST_FILE, RELATIONSHIPS_FILE, REQUIRED_ARTIFACTS,
    SECTIONS_FILE, STYLES_FILE,
};
use crate::error::LoaderError;
use crate::models::{
    Attachment, Block, IndexSummary, Manifest, RelationshipRecord, RelationshipsFile, Section,
    SectionTree, StyleUsage, StylesFile,
};

#[derive(Debug)]
pub struct ArtifactLoader {
    dir: PathBuf,
    manifest: Manifest,
    blocks: Vec<Block>,
    sections: SectionTree,
    relationships: Vec<RelationshipRecord>,
    styles: Vec<StyleUsage>,
    by_id: HashMap<String, usize>,
    by_ordinal: HashMap<String, usize>,
    by_para_id: HashMap<String, usize>,
    /// Child-index path from the root to each section.
    section_paths: HashMap<String, Vec<usize>>,
    section_of_block: HashMap<String, String>,
    relationship_by_block: HashMap<String, usize>,
    clause_groups: HashMap<String, Vec<usize>>,
}

impl ArtifactLoader {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, LoaderError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(LoaderError::DirectoryMissing(dir.to_path_buf()));
        }
        for name in REQUIRED_ARTIFACTS {
            if !dir.join(name).is_file() {
                return Err(LoaderError::ArtifactMissing {
                    file: name.to_string(),
                });
            }
        }

        let manifest: Manifest = read_json(dir, MANIFEST_FILE)?;
        let blocks = read_jsonl(dir, BLOCKS_FILE)?;
        let sections: SectionTree = read_json(dir, SECTIONS_FILE)?;
        let relationships = read_json::<RelationshipsFile>(dir, RELATIONSHIPS_FILE)?.relationships;
        let styles = read_json::<StylesFile>(dir, STYLES_FILE)?.styles;
        let index: IndexSummary = read_json(dir, INDEX_FILE)?;

        let loader = Self::from_parts(dir.to_path_buf(), manifest, blocks, sections, relationships, styles);
        loader.validate_counts(&index)?;

        info!(
            dir = %dir.display(),
            blocks = loader.blocks.len(),
            sections = loader.section_paths.len(),
            "artifacts loaded"
        );
        Ok(loader)
    }

    fn from_parts(
        dir: PathBuf,
        manifest: Manifest,
        blocks: Vec<Block>,
        sections: SectionTree,
        relationships: Vec<RelationshipRecord>,
        styles: Vec<StyleUsage>,
    ) -> Self {
        let mut by_id = HashMap::with_capacity(blocks.len());
        let mut by_ordinal: HashMap<String, usize> = HashMap::new();
        let mut by_para_id = HashMap::with_capacity(blocks.len());
        let mut clause_groups: HashMap<String, Vec<usize>> = HashMap::new();
        let mut duplicate_ordinals = 0usize;

        for (i, block) in blocks.iter().enumerate() {
            by_id.insert(block.id.clone(), i);
            by_para_id.insert(block.para_id.clone(), i);
            clause_groups
                .entry(block.clause_group_id.clone())
                .or_default()
                .push(i);
            if let Some(ordinal) = block.ordinal()
                && let Some(previous) = by_ordinal.insert(ordinal.to_string(), i)
            {
                duplicate_ordinals += 1;
                debug!(
                    ordinal,
                    previous = %blocks[previous].id,
                    current = %block.id,
                    "duplicate ordinal, later block wins"
                );
            }
        }
        if duplicate_ordinals > 0 {
            warn!(
                duplicates = duplicate_ordinals,
                "ordinal index has duplicate ordinals; lookups return the last occurrence"
            );
        }

        let mut section_paths = HashMap::new();
        let mut section_of_block = HashMap::new();
        let mut path = Vec::new();
        index_sections(
            &sections.root.children,
            &mut path,
            &mut section_paths,
            &mut section_of_block,
        );

        let relationship_by_block = relationships
            .iter()
            .enumerate()
            .map(|(i, r)| (r.block_id.clone(), i))
            .collect();

        Self {
            dir,
            manifest,
            blocks,
            sections,
            relationships,
            styles,
            by_id,
            by_ordinal,
            by_para_id,
            section_paths,
            section_of_block,
            relationship_by_block,
            clause_groups,
        }
    }

    fn validate_counts(&self, index: &IndexSummary) -> Result<(), LoaderError> {
        let actual = (
            self.blocks.len(),
            self.section_paths.len(),
            self.manifest.attachments.len(),
        );
        let expected = (index.block_count, index.section_count, index.attachment_count);
        if actual != expected {
            return Err(LoaderError::ArtifactMalformed {
                file: INDEX_FILE.to_string(),
                line: None,
                detail: format!(
                    "counts (blocks, sections, attachments) {expected:?} do not match loaded {actual:?}"
                ),
            });
        }
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn doc_id(&self) -> &str {
        &self.manifest.doc_id
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn styles(&self) -> &[StyleUsage] {
        &self.styles
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn relationships(&self) -> &[RelationshipRecord] {
        &self.relationships
    }

    pub fn section_tree(&self) -> &SectionTree {
        &self.sections
    }

    pub fn block(&self, block_id: &str) -> Option<&Block> {
        self.by_id.get(block_id).map(|&i| &self.blocks[i])
    }

    pub fn find_by_ordinal(&self, ordinal: &str) -> Option<&Block> {
        self.by_ordinal.get(ordinal).map(|&i| &self.blocks[i])
    }

    pub fn find_by_para_id(&self, para_id: &str) -> Option<&Block> {
        self.by_para_id
            .get(para_id)
            .or_else(|| self.by_para_id.get(&para_id.to_ascii_uppercase()))
            .map(|&i| &self.blocks[i])
    }

    pub fn relationship(&self, block_id: &str) -> Option<&RelationshipRecord> {
        self.relationship_by_block
            .get(block_id)
            .map(|&i| &self.relationships[i])
    }

    /// The block's clause group in document order: the main clause first, then
    /// the blocks grouped with it.
    pub fn clause_group(&self, block_id: &str) -> Vec<&Block> {
        let Some(block) = self.block(block_id) else {
            return Vec::new();
        };
        match self.clause_groups.get(&block.clause_group_id) {
            Some(members) => members.iter().map(|&i| &self.blocks[i]).collect(),
            None => vec![block],
        }
    }

    /// Every section in pre-order.
    pub fn sections(&self) -> Vec<&Section> {
        self.sections.iter().collect()
    }

    pub fn section(&self, section_id: &str) -> Option<&Section> {
        let path = self.section_paths.get(section_id)?;
        let (first, rest) = path.split_first()?;
        let mut section = self.sections.root.children.get(*first)?;
        for &i in rest {
            section = section.children.get(i)?;
        }
        Some(section)
    }

    pub fn section_for_block(&self, block_id: &str) -> Option<&Section> {
        self.section_of_block
            .get(block_id)
            .and_then(|section_id| self.section(section_id))
    }

    pub fn section_blocks(&self, section_id: &str) -> Vec<&Block> {
        self.section(section_id)
            .map(|section| {
                section
                    .block_ids
                    .iter()
                    .filter_map(|id| self.block(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Titles from the top-level section down to `section_id`.
    pub fn section_path(&self, section_id: &str) -> Vec<String> {
        let Some(path) = self.section_paths.get(section_id) else {
            return Vec::new();
        };
        let mut titles = Vec::with_capacity(path.len());
        let mut level = &self.sections.root.children;
        for &i in path {
            let Some(section) = level.get(i) else {
                break;
            };
            titles.push(section.title.clone());
            level = &section.children;
        }
        titles
    }

    pub fn schedules(&self) -> &[Attachment] {
        &self.manifest.attachments
    }

    pub fn schedule_blocks(&self, attachment_id: &str) -> Vec<&Block> {
        self.blocks
            .iter()
            .filter(|b| b.attachment_id.as_deref() == Some(attachment_id))
            .collect()
    }

    pub fn search(&self, query: &SearchQuery) -> Vec<&Block> {
        let matches = query.matcher();
        self.blocks.iter().filter(|b| matches(b)).collect()
    }

    pub fn parent(&self, block_id: &str) -> Option<&Block> {
        self.relationship(block_id)?
            .parent_block_id
            .as_deref()
            .and_then(|id| self.block(id))
    }

    pub fn children(&self, block_id: &str) -> Vec<&Block> {
        self.relationship(block_id)
            .map(|r| r.child_block_ids.iter().filter_map(|id| self.block(id)).collect())
            .unwrap_or_default()
    }

    /// Nearest first.
    pub fn ancestors(&self, block_id: &str) -> Vec<&Block> {
        let mut out = Vec::new();
        let mut current = self.parent(block_id);
        while let Some(block) = current {
            // Parents precede children, so a chain longer than the document is corrupt.
            if out.len() >= self.blocks.len() {
                break;
            }
            out.push(block);
            current = self.parent(&block.id);
        }
        out
    }

    /// Pre-order, excluding the block itself.
    pub fn descendants(&self, block_id: &str) -> Vec<&Block> {
        let mut out = Vec::new();
        let mut stack: Vec<&Block> = self.children(block_id).into_iter().rev().collect();
        while let Some(block) = stack.pop() {
            if out.len() >= self.blocks.len() {
                break;
            }
            out.push(block);
            stack.extend(self.children(&block.id).into_iter().rev());
        }
        out
    }

    pub fn stats(&self) -> DocumentStats {
        DocumentStats {
            block_count: self.blocks.len(),
            section_count: self.section_paths.len(),
            attachment_count: self.manifest.attachments.len(),
            heading_count: self.blocks.iter().filter(|b| b.is_heading()).count(),
            numbered_count: self.blocks.iter().filter(|b| b.has_numbering()).count(),
            table_count: self.blocks.iter().filter(|b| b.is_table()).count(),
            continuation_count: self
                .blocks
                .iter()
                .filter(|b| b.continuation_of.is_some())
                .count(),
            clause_group_count: self.clause_groups.len(),
            hierarchy_depth: self.sections.hierarchy_depth,
        }
    }
}

fn index_sections(
    sections: &[Section],
    path: &mut Vec<usize>,
    section_paths: &mut HashMap<String, Vec<usize>>,
    section_of_block: &mut HashMap<String, String>,
) {
    for (i, section) in sections.iter().enumerate() {
        path.push(i);
        section_paths.insert(section.id.clone(), path.clone());
        for block_id in &section.block_ids {
            section_of_block.insert(block_id.clone(), section.id.clone());
        }
        index_sections(&section.children, path, section_paths, section_of_block);
        path.pop();
    }
}

fn read_text(dir: &Path, name: &str) -> Result<String, LoaderError> {
    fs::read_to_string(dir.join(name)).map_err(|source| LoaderError::Io {
        file: name.to_string(),
        source,
    })
}

fn read_json<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<T, LoaderError> {
    let content = read_text(dir, name)?;
    serde_json::from_str(&content).map_err(|e| LoaderError::ArtifactMalformed {
        file: name.to_string(),
        line: Some(e.line()).filter(|&l| l > 0),
        detail: e.to_string(),
    })
}

fn read_jsonl<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<Vec<T>, LoaderError> {
    let content = read_text(dir, name)?;
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line).map_err(|e| LoaderError::ArtifactMalformed {
                file: name.to_string(),
                line: Some(n + 1),
                detail: e.to_string(),
            })
        })
        .collect()
}
