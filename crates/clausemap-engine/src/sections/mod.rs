//! # Sectionizer
//!
//! Builds the table-of-contents tree from the enriched block stream. Headings
//! and numbered clauses open sections; everything else lands in the innermost
//! open section, or in a lazily created "Front Matter" section when none is open.

pub mod roles;

use tracing::info;

use crate::models::{Block, Section, SectionRole, SectionRoot, SectionTree};
pub use roles::{infer_role, normalize_title};

const FRONT_MATTER_TITLE: &str = "Front Matter";
const MAX_TITLE_CHARS: usize = 120;
const MAX_SECTION_LEVEL: u8 = 6;

#[derive(Debug)]
struct Draft {
    title: String,
    level: u8,
    block_indices: Vec<usize>,
    children: Vec<usize>,
    parent: Option<usize>,
    role: Option<SectionRole>,
    attachment_id: Option<String>,
}

#[derive(Debug, Default)]
pub struct Sectionizer {
    drafts: Vec<Draft>,
    roots: Vec<usize>,
    /// Open heading sections as `(level, draft)`.
    headings: Vec<(u8, usize)>,
    /// Open numbered sections as `(list level + 1, draft)`.
    numbered: Vec<(u8, usize)>,
    front_matter: Option<(Option<String>, usize)>,
    attachment: Option<String>,
}

impl Sectionizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, index: usize, block: &Block) {
        if block.attachment_id != self.attachment {
            self.attachment = block.attachment_id.clone();
            self.headings.clear();
            self.numbered.clear();
        }

        if block.is_heading() {
            let level = block.level.unwrap_or(1).clamp(1, MAX_SECTION_LEVEL);
            while self.headings.last().is_some_and(|&(l, _)| l >= level) {
                self.headings.pop();
            }
            self.numbered.clear();
            let parent = self.headings.last().map(|&(_, draft)| draft);
            let draft = self.open(section_title(block), level, parent, block);
            self.headings.push((level, draft));
            self.drafts[draft].block_indices.push(index);
        } else if let Some(list) = block.list.as_ref().filter(|_| opens_section(block)) {
            let depth = list.level + 1;
            while self.numbered.last().is_some_and(|&(d, _)| d >= depth) {
                self.numbered.pop();
            }
            let parent = self.active();
            let draft = self.open(
                section_title(block),
                depth.min(MAX_SECTION_LEVEL),
                parent,
                block,
            );
            self.numbered.push((depth, draft));
            self.drafts[draft].block_indices.push(index);
        } else {
            let draft = match self.active() {
                Some(draft) => draft,
                None => self.front_matter(block),
            };
            self.drafts[draft].block_indices.push(index);
        }
    }

    pub fn finish(mut self, doc_id: &str, blocks: &[Block]) -> SectionTree {
        for draft in &mut self.drafts {
            if draft.role.is_none() {
                draft.role = infer_role(&draft.title);
            }
        }
        if let Some(&main) = self.roots.iter().find(|&&root| {
            let draft = &self.drafts[root];
            draft.role.is_none() && draft.attachment_id.is_none()
        }) {
            self.drafts[main].role = Some(SectionRole::MainBody);
        }

        let children: Vec<Section> = self
            .roots
            .iter()
            .map(|&root| self.build(root, blocks))
            .collect();

        let section_count = self.drafts.len();
        let block_count: usize = self.drafts.iter().map(|d| d.block_indices.len()).sum();
        let tree = SectionTree {
            doc_id: doc_id.to_string(),
            hierarchy_depth: children.iter().map(height).max().unwrap_or(0),
            depth_max: self.drafts.iter().map(|d| d.level).max().unwrap_or(0),
            avg_blocks_per_section: if section_count == 0 {
                0.0
            } else {
                (block_count as f64 / section_count as f64 * 100.0).round() / 100.0
            },
            root: SectionRoot { children },
        };
        info!(
            sections = section_count,
            depth = tree.hierarchy_depth,
            "sections built"
        );
        tree
    }

    /// Innermost open section.
    fn active(&self) -> Option<usize> {
        self.numbered
            .last()
            .or(self.headings.last())
            .map(|&(_, draft)| draft)
    }

    fn front_matter(&mut self, block: &Block) -> usize {
        if let Some((attachment, draft)) = &self.front_matter
            && *attachment == block.attachment_id
        {
            return *draft;
        }
        let draft = self.open(FRONT_MATTER_TITLE.to_string(), 1, None, block);
        self.drafts[draft].role = Some(SectionRole::FrontMatter);
        self.front_matter = Some((block.attachment_id.clone(), draft));
        draft
    }

    fn open(&mut self, title: String, level: u8, parent: Option<usize>, block: &Block) -> usize {
        let draft = self.drafts.len();
        self.drafts.push(Draft {
            title,
            level,
            block_indices: Vec::new(),
            children: Vec::new(),
            parent,
            role: None,
            attachment_id: block.attachment_id.clone(),
        });
        match parent {
            Some(p) => self.drafts[p].children.push(draft),
            None => self.roots.push(draft),
        }
        draft
    }

    fn build(&self, draft: usize, blocks: &[Block]) -> Section {
        let d = &self.drafts[draft];
        Section {
            id: section_id(draft),
            title: d.title.clone(),
            level: d.level,
            block_ids: d.block_indices.iter().map(|&i| blocks[i].id.clone()).collect(),
            children: d.children.iter().map(|&c| self.build(c, blocks)).collect(),
            parent_id: d.parent.map(section_id),
            role: d.role,
            attachment_id: d.attachment_id.clone(),
            char_count: d
                .block_indices
                .iter()
                .map(|&i| blocks[i].text.chars().count())
                .sum(),
        }
    }
}

/// Build the section tree for a block stream in one go.
pub fn build_sections(doc_id: &str, blocks: &[Block]) -> SectionTree {
    let mut sectionizer = Sectionizer::new();
    for (index, block) in blocks.iter().enumerate() {
        sectionizer.push(index, block);
    }
    sectionizer.finish(doc_id, blocks)
}

/// Visible numbered clauses open sections; bullets and unlabelled items do not.
fn opens_section(block: &Block) -> bool {
    block.ordinal().is_some() && block.is_labelled()
}

fn section_id(draft: usize) -> String {
    format!("sec-{:04}", draft + 1)
}

fn section_title(block: &Block) -> String {
    let line = block.text.lines().next().unwrap_or_default().trim();
    let title = match block.ordinal() {
        Some(ordinal) if !block.is_heading() => format!("{ordinal} {line}"),
        _ => line.to_string(),
    };
    let title = title.trim();
    match title.char_indices().nth(MAX_TITLE_CHARS) {
        Some((cut, _)) => title[..cut].trim_end().to_string(),
        None => title.to_string(),
    }
}

fn height(section: &Section) -> usize {
    1 + section.children.iter().map(height).max().unwrap_or(0)
}
