use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::lock::DirLock;
use super::{
    BLOCKS_FILE, INDEX_FILE, MANIFEST_FILE, RAW_COPY_FILE, RELATIONSHIPS_FILE, SECTIONS_FILE,
    STYLES_FILE,
};
use crate::error::AnalysisError;
use crate::models::artifacts::{RULESET_VERSION, SCHEMA_VERSION};
use crate::models::{Analysis, Block, Manifest, RelationshipsFile, StylesFile};

pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Emit the full artifact set for `analysis` into `dir`.
///
/// Every file, the manifest included, is first written and synced to a temp
/// file in the same directory. Only when all of them are staged and every
/// target is free to be replaced are they renamed into place, manifest last.
/// A failure before that point removes the temp files and leaves the previous
/// artifact set untouched.
pub fn write_artifacts(
    analysis: &Analysis,
    dir: &Path,
    raw_copy: Option<&[u8]>,
) -> Result<Manifest, AnalysisError> {
    fs::create_dir_all(dir).map_err(|e| AnalysisError::io(dir, e))?;
    let _lock = DirLock::acquire(dir)?;

    let doc_id = analysis.doc_id.clone();
    let artifacts: [(&str, Vec<u8>); 5] = [
        (BLOCKS_FILE, jsonl(&analysis.blocks)?),
        (SECTIONS_FILE, pretty(SECTIONS_FILE, &analysis.sections)?),
        (
            RELATIONSHIPS_FILE,
            pretty(
                RELATIONSHIPS_FILE,
                &RelationshipsFile {
                    doc_id: doc_id.clone(),
                    relationships: analysis.relationships.clone(),
                },
            )?,
        ),
        (
            STYLES_FILE,
            pretty(
                STYLES_FILE,
                &StylesFile {
                    doc_id: doc_id.clone(),
                    styles: analysis.styles.clone(),
                },
            )?,
        ),
        (INDEX_FILE, pretty(INDEX_FILE, &analysis.index_summary())?),
    ];

    let mut checksums = BTreeMap::new();
    let mut staged = Vec::with_capacity(artifacts.len() + 2);
    for (name, bytes) in &artifacts {
        staged.push(stage(dir, name, bytes)?);
        checksums.insert(name.to_string(), checksum(bytes));
    }
    if let Some(raw) = raw_copy {
        staged.push(stage(dir, RAW_COPY_FILE, raw)?);
        checksums.insert(RAW_COPY_FILE.to_string(), checksum(raw));
    }

    let manifest = Manifest {
        doc_id,
        v: SCHEMA_VERSION,
        created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        ruleset: Some(RULESET_VERSION.to_string()),
        source: analysis.source.clone(),
        checksums,
        attachments: analysis.attachments.clone(),
    };
    staged.push(stage(dir, MANIFEST_FILE, &pretty(MANIFEST_FILE, &manifest)?)?);

    for artifact in &staged {
        artifact.check_target(dir)?;
    }
    for artifact in staged {
        artifact.commit(dir)?;
    }

    info!(
        dir = %dir.display(),
        doc_id = %manifest.doc_id,
        files = manifest.checksums.len() + 1,
        "artifacts written"
    );
    Ok(manifest)
}

fn checksum(bytes: &[u8]) -> String {
    format!("sha256:{}", sha256_hex(bytes))
}

fn pretty<T: Serialize>(artifact: &'static str, value: &T) -> Result<Vec<u8>, AnalysisError> {
    let mut bytes = serde_json::to_vec_pretty(value)
        .map_err(|source| AnalysisError::Serialize { artifact, source })?;
    bytes.push(b'\n');
    Ok(bytes)
}

fn jsonl(blocks: &[Block]) -> Result<Vec<u8>, AnalysisError> {
    let mut bytes = Vec::new();
    for block in blocks {
        serde_json::to_writer(&mut bytes, block).map_err(|source| AnalysisError::Serialize {
            artifact: BLOCKS_FILE,
            source,
        })?;
        bytes.push(b'\n');
    }
    Ok(bytes)
}

/// An artifact written to a temp file, waiting to be renamed over its target.
struct Staged {
    name: &'static str,
    bytes: usize,
    tmp: NamedTempFile,
}

impl Staged {
    /// Only a missing target or a regular file can be atomically replaced.
    fn check_target(&self, dir: &Path) -> Result<(), AnalysisError> {
        let target = dir.join(self.name);
        match fs::symlink_metadata(&target) {
            Ok(meta) if !meta.is_file() => Err(AnalysisError::io(
                &target,
                std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    "artifact path is occupied by something other than a file",
                ),
            )),
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AnalysisError::io(&target, e)),
        }
    }

    fn commit(self, dir: &Path) -> Result<(), AnalysisError> {
        let target = dir.join(self.name);
        self.tmp
            .persist(&target)
            .map_err(|e| AnalysisError::io(&target, e.error))?;
        debug!(file = self.name, bytes = self.bytes, "artifact persisted");
        Ok(())
    }
}

fn stage(dir: &Path, name: &'static str, bytes: &[u8]) -> Result<Staged, AnalysisError> {
    let mut tmp = tempfile::Builder::new()
        .prefix(&format!(".{name}."))
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| AnalysisError::io(dir, e))?;
    write_all(&mut tmp, bytes).map_err(|e| AnalysisError::io(tmp.path(), e))?;
    Ok(Staged {
        name,
        bytes: bytes.len(),
        tmp,
    })
}

fn write_all(tmp: &mut NamedTempFile, bytes: &[u8]) -> std::io::Result<()> {
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::LOCK_FILE;
    use crate::tests::sample_analysis;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_writes_every_artifact_with_checksums() {
        let dir = TempDir::new().unwrap();
        let analysis = sample_analysis();

        let manifest = write_artifacts(&analysis, dir.path(), None).unwrap();

        for name in [BLOCKS_FILE, SECTIONS_FILE, RELATIONSHIPS_FILE, STYLES_FILE, INDEX_FILE] {
            let bytes = fs::read(dir.path().join(name)).unwrap();
            assert_eq!(manifest.checksums[name], format!("sha256:{}", sha256_hex(&bytes)));
        }
        assert!(dir.path().join(MANIFEST_FILE).exists());
        assert!(!manifest.checksums.contains_key(MANIFEST_FILE));
        assert!(!dir.path().join(LOCK_FILE).exists());
    }

    #[test]
    fn test_blocks_are_one_object_per_line() {
        let dir = TempDir::new().unwrap();
        let analysis = sample_analysis();

        write_artifacts(&analysis, dir.path(), None).unwrap();

        let content = fs::read_to_string(dir.path().join(BLOCKS_FILE)).unwrap();
        assert_eq!(content.lines().count(), analysis.blocks.len());
        assert!(content.ends_with('\n'));
        for line in content.lines() {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(value.get("clause_group_id").is_some());
        }
    }

    #[test]
    fn test_raw_copy_is_recorded() {
        let dir = TempDir::new().unwrap();

        let manifest = write_artifacts(&sample_analysis(), dir.path(), Some(b"PK raw".as_slice())).unwrap();

        assert_eq!(fs::read(dir.path().join(RAW_COPY_FILE)).unwrap(), b"PK raw");
        assert_eq!(
            manifest.checksums[RAW_COPY_FILE],
            format!("sha256:{}", sha256_hex(b"PK raw"))
        );
    }

    #[test]
    fn test_locked_directory_is_refused() {
        let dir = TempDir::new().unwrap();
        let _held = DirLock::acquire(dir.path()).unwrap();

        let err = write_artifacts(&sample_analysis(), dir.path(), None).unwrap_err();

        assert!(matches!(err, AnalysisError::DirectoryLocked(_)));
        assert!(!dir.path().join(MANIFEST_FILE).exists());
    }

    fn listing(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_failed_write_into_fresh_directory_leaves_nothing() {
        // Given a directory whose index path is taken by a directory
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(INDEX_FILE)).unwrap();

        // When writing the artifacts
        let err = write_artifacts(&sample_analysis(), dir.path(), None).unwrap_err();

        // Then nothing besides the obstruction is left behind
        assert!(matches!(err, AnalysisError::Io { .. }));
        assert_eq!(listing(dir.path()), vec![INDEX_FILE.to_string()]);
    }

    #[test]
    fn test_failed_rewrite_keeps_previous_artifacts() {
        // Given a complete artifact set from an earlier run
        let dir = TempDir::new().unwrap();
        let first = sample_analysis();
        write_artifacts(&first, dir.path(), None).unwrap();
        let kept = [BLOCKS_FILE, SECTIONS_FILE, RELATIONSHIPS_FILE, STYLES_FILE, MANIFEST_FILE];
        let before: Vec<(String, Vec<u8>)> = kept
            .iter()
            .map(|name| (name.to_string(), fs::read(dir.path().join(name)).unwrap()))
            .collect();
        fs::remove_file(dir.path().join(INDEX_FILE)).unwrap();
        fs::create_dir(dir.path().join(INDEX_FILE)).unwrap();

        // When a different analysis cannot be fully written
        let mut second = sample_analysis();
        second.doc_id = "doc-other".to_string();
        second.blocks.truncate(2);
        let result = write_artifacts(&second, dir.path(), Some(b"PK raw".as_slice()));

        // Then every earlier file is byte-for-byte unchanged and no temp files remain
        assert!(result.is_err());
        for (name, bytes) in before {
            assert_eq!(fs::read(dir.path().join(&name)).unwrap(), bytes, "{name}");
        }
        assert!(!dir.path().join(RAW_COPY_FILE).exists());
        assert!(listing(dir.path()).iter().all(|name| !name.ends_with(".tmp")));
        assert!(!dir.path().join(LOCK_FILE).exists());
    }

    #[test]
    fn test_created_at_is_utc_seconds() {
        let dir = TempDir::new().unwrap();

        let manifest = write_artifacts(&sample_analysis(), dir.path(), None).unwrap();

        assert!(manifest.created_at.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&manifest.created_at).is_ok());
        assert_eq!(manifest.v, 1);
    }
}
