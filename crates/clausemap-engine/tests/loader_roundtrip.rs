mod common;

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use clausemap_engine::io::{MANIFEST_FILE, REQUIRED_ARTIFACTS};
use clausemap_engine::{AnalysisConfig, ArtifactLoader, Manifest, Pipeline};
use common::{DocxBuilder, init_tracing};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn contract() -> DocxBuilder {
    DocxBuilder::new()
        .heading(1, "Parties")
        .paragraph("Acme Ltd and Widget plc")
        .heading(1, "Terms")
        .numbered(1, 0, "Definitions")
        .numbered(1, 1, "Agreement means this document.")
        .paragraph("Including its schedules.")
        .numbered(1, 0, "Services")
        .paragraph("The supplier provides support.")
        .numbered(3, 1, "first")
        .numbered(3, 1, "second")
        .table(&[&["Fee", "100"]])
        .styled("ScheduleTitle", "Schedule 1")
        .numbered(2, 0, "Scope")
}

fn emit_to(bytes: &[u8], dir: &Path) -> Manifest {
    init_tracing();
    let pipeline = Pipeline::new(AnalysisConfig::default()).unwrap();
    let document = pipeline.analyze_bytes(bytes, None).unwrap();
    pipeline.write(&document, dir).unwrap()
}

#[test]
fn loading_reproduces_emitted_collections() {
    // Given an analysed contract
    init_tracing();
    let pipeline = Pipeline::new(AnalysisConfig::default()).unwrap();
    let document = pipeline.analyze_bytes(&contract().build(), None).unwrap();
    let dir = TempDir::new().unwrap();
    let manifest = pipeline.write(&document, dir.path()).unwrap();

    // When loading it back
    let loader = ArtifactLoader::open(dir.path()).unwrap();

    // Then blocks, sections and relationships survive unchanged and in order
    let analysis = &document.analysis;
    assert_eq!(loader.blocks(), analysis.blocks.as_slice());
    assert_eq!(loader.section_tree(), &analysis.sections);
    assert_eq!(loader.relationships(), analysis.relationships.as_slice());
    assert_eq!(loader.styles(), analysis.styles.as_slice());
    assert_eq!(loader.manifest(), &manifest);
    assert_eq!(loader.doc_id(), analysis.doc_id);
    assert_eq!(loader.schedules(), analysis.attachments.as_slice());
}

#[test]
fn emitting_twice_is_byte_identical_apart_from_timestamp() {
    let bytes = contract().build();
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();

    let mut a = emit_to(&bytes, first.path());
    let mut b = emit_to(&bytes, second.path());

    for name in REQUIRED_ARTIFACTS.iter().filter(|&&n| n != MANIFEST_FILE) {
        assert_eq!(
            fs::read(first.path().join(name)).unwrap(),
            fs::read(second.path().join(name)).unwrap(),
            "{name} differs between runs"
        );
    }
    a.created_at.clear();
    b.created_at.clear();
    assert_eq!(a, b);
}

#[test]
fn rewriting_a_directory_replaces_the_artifact_set() {
    let dir = TempDir::new().unwrap();
    emit_to(&contract().build(), dir.path());

    let smaller = DocxBuilder::new().paragraph("Only paragraph");
    emit_to(&smaller.build(), dir.path());

    let loader = ArtifactLoader::open(dir.path()).unwrap();
    assert_eq!(loader.blocks().len(), 1);
    assert_eq!(loader.stats().section_count, 1);
    assert_eq!(loader.sections()[0].title, "Front Matter");
}

#[test]
fn loader_is_shareable_across_threads() {
    let dir = TempDir::new().unwrap();
    emit_to(&contract().build(), dir.path());
    let loader = Arc::new(ArtifactLoader::open(dir.path()).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let loader = Arc::clone(&loader);
            thread::spawn(move || {
                let services = loader.find_by_ordinal("2.").map(|b| b.id.clone());
                (services, loader.stats().block_count)
            })
        })
        .collect();

    let expected = (
        loader.find_by_ordinal("2.").map(|b| b.id.clone()),
        loader.blocks().len(),
    );
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn stats_summarise_the_document() {
    let dir = TempDir::new().unwrap();
    emit_to(&contract().build(), dir.path());
    let loader = ArtifactLoader::open(dir.path()).unwrap();

    let stats = loader.stats();

    assert_eq!(stats.block_count, 13);
    assert_eq!(stats.heading_count, 3);
    assert_eq!(stats.table_count, 1);
    assert_eq!(stats.attachment_count, 1);
    assert_eq!(stats.continuation_count, 1);
    assert_eq!(stats.numbered_count, 6);
}
