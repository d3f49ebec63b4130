//! End-to-end scenarios: real `.docx` packages through the pipeline and loader.

mod common;

use std::fs;

use clausemap_engine::io::{BLOCKS_FILE, RELATIONSHIPS_FILE};
use clausemap_engine::{
    AnalysisConfig, AnalysisError, AnalyzedDocument, ArtifactLoader, AttachmentType, BlockType,
    DiagnosticKind, LoaderError, Pipeline, SearchQuery, SectionRole,
};
use common::{DocxBuilder, init_tracing, zip_parts};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn analyze(builder: &DocxBuilder) -> AnalyzedDocument {
    init_tracing();
    Pipeline::new(AnalysisConfig::default())
        .unwrap()
        .analyze_bytes(&builder.build(), Some("doc-test"))
        .unwrap()
}

fn emit(builder: &DocxBuilder) -> (TempDir, ArtifactLoader) {
    let document = analyze(builder);
    let dir = TempDir::new().unwrap();
    Pipeline::new(AnalysisConfig::default())
        .unwrap()
        .write(&document, dir.path())
        .unwrap();
    let loader = ArtifactLoader::open(dir.path()).unwrap();
    (dir, loader)
}

fn three_level_clause() -> DocxBuilder {
    DocxBuilder::new()
        .numbered(1, 0, "Definitions")
        .numbered(1, 1, "Agreement")
        .numbered(1, 2, "Each party agrees.")
}

#[test]
fn simple_decimal_three_level_clause() {
    // Given three numbered paragraphs at increasing levels
    let document = analyze(&three_level_clause());
    let blocks = &document.analysis.blocks;

    // Then they render as a decimal outline
    let ordinals: Vec<Option<&str>> = blocks.iter().map(|b| b.ordinal()).collect();
    assert_eq!(ordinals, vec![Some("1."), Some("1.1"), Some("1.1.1")]);

    // And form a parent chain up to the root
    assert_eq!(blocks[0].parent_block_id, None);
    assert_eq!(blocks[1].parent_block_id.as_deref(), Some(blocks[0].id.as_str()));
    assert_eq!(blocks[2].parent_block_id.as_deref(), Some(blocks[1].id.as_str()));

    // And each clause is its own group
    assert!(blocks.iter().all(|b| b.clause_group_id == b.id));
    assert!(blocks.iter().all(|b| b.style == "Normal"));
}

#[test]
fn main_clause_with_two_continuations() {
    // Given "3. Services." with two plain paragraphs, then "4. Fees." with three
    let document = analyze(
        &DocxBuilder::new()
            .numbered(5, 0, "Services.")
            .indented("The supplier provides support.", 120)
            .paragraph("Support hours are 9 to 5.")
            .numbered(5, 0, "Fees.")
            .paragraph("Monthly.")
            .paragraph("In arrears.")
            .paragraph("Not a continuation."),
    );
    let blocks = &document.analysis.blocks;
    let services = &blocks[0];
    let fees = &blocks[3];

    assert_eq!(services.ordinal(), Some("3."));
    assert_eq!(fees.ordinal(), Some("4."));

    // Then the first two paragraphs continue "3."
    for continuation in &blocks[1..3] {
        assert_eq!(continuation.continuation_of.as_deref(), Some(services.id.as_str()));
        assert_eq!(continuation.clause_group_id, services.id);
    }

    // And "4." starts its own group whose window closes after two paragraphs
    assert_eq!(fees.clause_group_id, fees.id);
    assert_eq!(blocks[4].continuation_of.as_deref(), Some(fees.id.as_str()));
    assert_eq!(blocks[5].continuation_of.as_deref(), Some(fees.id.as_str()));
    assert_eq!(blocks[6].continuation_of, None);
}

#[test]
fn unlabelled_sibling_confirmed_by_lookahead() {
    // Given (a), (b), an unlabelled list paragraph, then (c)
    let document = analyze(
        &DocxBuilder::new()
            .numbered(3, 0, "Obligations")
            .numbered(3, 1, "foo")
            .numbered(3, 1, "bar")
            .numbered(4, 1, "unlabelled")
            .numbered(3, 1, "baz"),
    );
    let blocks = &document.analysis.blocks;
    let clause = &blocks[0];
    let unlabelled = &blocks[3];

    assert_eq!(blocks[4].ordinal(), Some("(c)"));
    assert!(unlabelled.is_unlabelled());

    // Then it sits beside (b) under the enclosing clause
    assert_eq!(unlabelled.parent_block_id, blocks[2].parent_block_id);
    assert_eq!(unlabelled.parent_block_id.as_deref(), Some(clause.id.as_str()));
    assert_eq!(unlabelled.clause_group_id, clause.id);
    assert_eq!(unlabelled.continuation_of, None);
}

#[test]
fn attachment_scope() {
    // Given a main clause, then a Schedule 1 marker with its own numbered clauses
    let (_dir, loader) = emit(
        &DocxBuilder::new()
            .numbered(1, 0, "Term")
            .styled("ScheduleTitle", "Schedule 1")
            .numbered(2, 0, "Scope")
            .numbered(2, 0, "Deliverables"),
    );

    // Then exactly one schedule is listed
    let schedules = loader.schedules();
    assert_eq!(schedules.len(), 1);
    let schedule = &schedules[0];
    assert_eq!(schedule.attachment_id, "schedule-1");
    assert_eq!(schedule.attachment_type, AttachmentType::Schedule);
    assert_eq!(schedule.label, "Schedule 1");

    // And the marker plus both clauses belong to it, in order
    let texts: Vec<&str> = loader
        .schedule_blocks("schedule-1")
        .iter()
        .map(|b| b.text.as_str())
        .collect();
    assert_eq!(texts, vec!["Schedule 1", "Scope", "Deliverables"]);
    let ordinals: Vec<Option<&str>> = loader
        .schedule_blocks("schedule-1")
        .iter()
        .map(|b| b.ordinal())
        .collect();
    assert_eq!(ordinals, vec![None, Some("1."), Some("2.")]);

    // And the main body section stream is closed at the marker
    let term = loader.find_by_ordinal("1.").unwrap();
    assert_eq!(term.text, "Scope");
    let main = loader.search(&SearchQuery::new().text("Term"));
    let main_section = loader.section_for_block(&main[0].id).unwrap();
    assert_eq!(main_section.attachment_id, None);
    assert_eq!(main_section.block_ids, vec![main[0].id.clone()]);

    let scope_section = loader.section_for_block(&term.id).unwrap();
    assert_eq!(scope_section.attachment_id.as_deref(), Some("schedule-1"));
    assert_eq!(loader.section_path(&scope_section.id), vec!["Schedule 1", "1. Scope"]);
    assert!(loader.schedule_blocks("annex-a").is_empty());
}

#[test]
fn search_and_ordinal_lookup() {
    let (_dir, loader) = emit(&three_level_clause());

    let third = loader.find_by_ordinal("1.1.1").unwrap();
    assert_eq!(third.id, loader.blocks()[2].id);

    let hits = loader.search(&SearchQuery::new().text("agree").has_numbering(true));
    let ids: Vec<&str> = hits.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, vec![loader.blocks()[1].id.as_str(), loader.blocks()[2].id.as_str()]);
}

#[test]
fn malformed_artifacts_are_reported() {
    // Given an emitted directory with relationships.json removed
    let (dir, _) = emit(&three_level_clause());
    fs::remove_file(dir.path().join(RELATIONSHIPS_FILE)).unwrap();

    let err = ArtifactLoader::open(dir.path()).unwrap_err();
    assert!(matches!(err, LoaderError::ArtifactMissing { ref file } if file == RELATIONSHIPS_FILE));
    assert!(err.to_string().contains(RELATIONSHIPS_FILE));

    // Given an emitted directory with a corrupt second line in blocks.jsonl
    let (dir, _) = emit(&three_level_clause());
    let path = dir.path().join(BLOCKS_FILE);
    let content = fs::read_to_string(&path).unwrap();
    let corrupted: Vec<&str> = content
        .lines()
        .enumerate()
        .map(|(i, line)| if i == 1 { "{\"id\": " } else { line })
        .collect();
    fs::write(&path, corrupted.join("\n")).unwrap();

    let err = ArtifactLoader::open(dir.path()).unwrap_err();
    assert!(matches!(
        err,
        LoaderError::ArtifactMalformed { ref file, line: Some(2), .. } if file == BLOCKS_FILE
    ));
    assert!(err.to_string().contains("blocks.jsonl (line 2)"));
}

#[test]
fn headings_tables_and_roles() {
    let document = analyze(
        &DocxBuilder::new()
            .heading(1, "Parties")
            .paragraph("Acme Ltd and Widget plc")
            .heading(1, "Definitions")
            .numbered(1, 0, "Affiliate means any group company.")
            .table(&[&["Term", "Meaning"], &["Fee", "The monthly charge"]])
            .heading(1, "Signatures")
            .paragraph("Signed by both parties"),
    );
    let analysis = &document.analysis;

    let table = analysis.blocks.iter().find(|b| b.is_table()).unwrap();
    assert_eq!(table.block_type, BlockType::Table);
    assert_eq!(table.text, "Term | Meaning\nFee | The monthly charge");
    assert_eq!(table.style, "Table");

    let roles: Vec<(String, Option<SectionRole>)> = analysis
        .sections
        .root
        .children
        .iter()
        .map(|s| (s.title.clone(), s.role))
        .collect();
    assert_eq!(
        roles,
        vec![
            ("Parties".to_string(), Some(SectionRole::Parties)),
            ("Definitions".to_string(), Some(SectionRole::Definitions)),
            ("Signatures".to_string(), Some(SectionRole::Signatures)),
        ]
    );
    assert_eq!(analysis.sections.hierarchy_depth, 2);
    assert_eq!(analysis.sections.depth_max, 1);
}

#[test]
fn missing_numbering_part_demotes_numbered_paragraphs() {
    let document = analyze(&three_level_clause().without_numbering());

    for block in &document.analysis.blocks {
        let list = block.list.as_ref().unwrap();
        assert_eq!(list.ordinal, "");
        assert!(!block.has_numbering());
        assert!(
            block
                .diagnostics
                .iter()
                .any(|d| d.kind == DiagnosticKind::NumberingResolution)
        );
    }
}

#[test]
fn package_without_document_part_is_invalid() {
    let bytes = zip_parts(&[("word/styles.xml", common::STYLES.to_string())]);

    let err = Pipeline::new(AnalysisConfig::default())
        .unwrap()
        .analyze_bytes(&bytes, None)
        .unwrap_err();

    assert!(matches!(err, AnalysisError::InvalidInputDocument(_)));
    assert!(err.to_string().contains("word/document.xml"));
}

#[test]
fn raw_copy_written_when_configured() {
    let bytes = three_level_clause().build();
    let input_dir = TempDir::new().unwrap();
    let input = input_dir.path().join("msa.docx");
    fs::write(&input, &bytes).unwrap();
    let out = TempDir::new().unwrap();
    let pipeline = Pipeline::new(AnalysisConfig {
        emit_raw_copy: true,
        ..AnalysisConfig::default()
    })
    .unwrap();

    let manifest = pipeline.run(&input, out.path()).unwrap();

    assert_eq!(fs::read(out.path().join("raw.docx")).unwrap(), bytes);
    assert!(manifest.checksums.contains_key("raw.docx"));
    assert!(manifest.doc_id.starts_with("doc-"));
    let source = manifest.source.unwrap();
    assert_eq!(source.file_name.as_deref(), Some("msa.docx"));
    assert_eq!(manifest.doc_id, format!("doc-{}", &source.sha256[..16]));
}
