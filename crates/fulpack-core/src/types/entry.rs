//! Archive entry metadata.

use std::time::SystemTime;

use serde::Deserialize;
use serde::Serialize;

use crate::checksum::Digest;

/// Kind of an archive entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Symbolic link.
    Symlink,
    /// Hard link, device, FIFO or anything else.
    Other,
}

impl EntryKind {
    /// Returns the lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "directory",
            Self::Symlink => "symlink",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata for one archive entry, as produced by `scan()`.
///
/// `path` is `/`-separated with no trailing slash. It is reported as stored
/// in the archive and has not been through path-safety validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    /// Entry path inside the archive.
    pub path: String,
    /// Entry kind.
    pub kind: EntryKind,
    /// Uncompressed size in bytes.
    pub size: u64,
    /// Compressed size in bytes, when the container records it per entry.
    pub compressed_size: Option<u64>,
    /// Permission bits.
    pub mode: Option<u32>,
    /// Modification time.
    pub modified: Option<SystemTime>,
    /// Embedded or container-native checksum.
    pub checksum: Option<Digest>,
}

impl ArchiveEntry {
    /// Number of path components.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.path.split('/').filter(|s| !s.is_empty()).count()
    }
}

/// Normalizes a raw stored name: `\` becomes `/`, trailing `/` is removed.
pub(crate) fn normalize_entry_path(raw: &str) -> String {
    let normalized = raw.replace('\\', "/");
    let trimmed = normalized.trim_end_matches('/');
    if trimmed.is_empty() {
        normalized
    } else {
        trimmed.to_string()
    }
}
