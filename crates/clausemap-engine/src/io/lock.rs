use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::warn;

use super::LOCK_FILE;
use crate::error::AnalysisError;

/// A lock older than this is assumed to belong to a writer that died.
pub const STALE_LOCK_AGE: Duration = Duration::from_secs(10 * 60);

/// Exclusive ownership of an analysis directory for one writer.
///
/// The lock file records the owning process id and is removed when the guard
/// drops. A process that aborts never runs the drop, so a lock whose owner is
/// gone, or which is older than [`STALE_LOCK_AGE`], is reclaimed.
#[derive(Debug)]
pub struct DirLock {
    path: PathBuf,
}

impl DirLock {
    pub fn acquire(dir: &Path) -> Result<Self, AnalysisError> {
        let path = dir.join(LOCK_FILE);
        match Self::create(&path) {
            Err(e) if e.kind() == ErrorKind::AlreadyExists && is_stale(&path) => {
                warn!(path = %path.display(), "reclaiming stale analysis directory lock");
                match fs::remove_file(&path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(AnalysisError::io(&path, e)),
                }
                Self::create(&path).map_err(|e| Self::refused(dir, &path, e))
            }
            result => result.map_err(|e| Self::refused(dir, &path, e)),
        }
    }

    fn create(path: &Path) -> std::io::Result<Self> {
        let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
        let owned = Self {
            path: path.to_path_buf(),
        };
        writeln!(file, "pid={}", std::process::id())?;
        Ok(owned)
    }

    fn refused(dir: &Path, path: &Path, e: std::io::Error) -> AnalysisError {
        if e.kind() == ErrorKind::AlreadyExists {
            AnalysisError::DirectoryLocked(dir.to_path_buf())
        } else {
            AnalysisError::io(path, e)
        }
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to release analysis directory lock");
        }
    }
}

fn is_stale(path: &Path) -> bool {
    let age = fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok());
    if age.is_some_and(|age| age > STALE_LOCK_AGE) {
        return true;
    }
    fs::read_to_string(path)
        .ok()
        .and_then(|content| owner_pid(&content))
        .is_some_and(|pid| !process_alive(pid))
}

fn owner_pid(content: &str) -> Option<u32> {
    content
        .lines()
        .find_map(|line| line.strip_prefix("pid="))
        .and_then(|pid| pid.trim().parse().ok())
}

#[cfg(target_os = "linux")]
fn process_alive(pid: u32) -> bool {
    Path::new("/proc").join(pid.to_string()).exists()
}

/// Without a cheap liveness probe only the age rule applies.
#[cfg(not(target_os = "linux"))]
fn process_alive(_pid: u32) -> bool {
    true
}
