//! On-disk artifact set: writing it atomically, loading it back for queries.

mod loader;
mod lock;
mod query;
mod writer;

pub use loader::ArtifactLoader;
pub use lock::DirLock;
pub use query::{DocumentStats, SearchQuery};
pub use writer::{sha256_hex, write_artifacts};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const BLOCKS_FILE: &str = "blocks.jsonl";
pub const SECTIONS_FILE: &str = "sections.json";
pub const RELATIONSHIPS_FILE: &str = "relationships.json";
pub const STYLES_FILE: &str = "styles.json";
pub const INDEX_FILE: &str = "index.json";
pub const RAW_COPY_FILE: &str = "raw.docx";
pub const LOCK_FILE: &str = ".clausemap.lock";

/// Files a loader refuses to start without.
pub const REQUIRED_ARTIFACTS: [&str; 6] = [
    MANIFEST_FILE,
    BLOCKS_FILE,
    SECTIONS_FILE,
    RELATIONSHIPS_FILE,
    STYLES_FILE,
    INDEX_FILE,
];
