//! Results returned by archive operations.
//!
//! These are plain values built once per call and handed to the caller.

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::formats::ArchiveFormat;

/// Summary of an archive's contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveInfo {
    /// Container format.
    pub format: ArchiveFormat,
    /// Number of entries, directories included.
    pub entry_count: usize,
    /// Sum of uncompressed entry sizes in bytes.
    pub total_size: u64,
    /// Size of the archive file in bytes.
    pub compressed_size: u64,
    /// `total_size / compressed_size`.
    ///
    /// Can be below 1.0 for small inputs: TAR pads every entry to 512-byte
    /// blocks and ZIP adds per-entry headers. `0.0` when `compressed_size`
    /// is zero.
    pub compression_ratio: f64,
}

impl ArchiveInfo {
    /// Builds an `ArchiveInfo`, computing the compression ratio.
    #[must_use]
    pub fn new(
        format: ArchiveFormat,
        entry_count: usize,
        total_size: u64,
        compressed_size: u64,
    ) -> Self {
        let compression_ratio = if compressed_size == 0 {
            0.0
        } else {
            total_size as f64 / compressed_size as f64
        };
        Self {
            format,
            entry_count,
            total_size,
            compressed_size,
            compression_ratio,
        }
    }
}

/// An error tied to one archive entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryError {
    /// Entry path as stored in the archive, or the archive path for
    /// container-level errors.
    pub path: String,
    /// Human-readable reason.
    pub reason: String,
}

impl EntryError {
    /// Creates an entry error.
    pub fn new(path: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

impl std::fmt::Display for EntryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

/// Outcome of an `extract()` call.
///
/// Per-entry failures never abort extraction (outside strict mode); they
/// are counted in `error_count` and described in `errors`, in archive order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractResult {
    /// Entries written to disk, directories included.
    pub extracted_count: usize,
    /// Entries left alone because the target existed under
    /// `OverwritePolicy::Skip`.
    pub skipped_count: usize,
    /// Entries that failed.
    pub error_count: usize,
    /// One description per failed entry.
    pub errors: Vec<EntryError>,
}

impl ExtractResult {
    /// Returns `true` if no entry failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error_count == 0
    }
}

/// A check run by `verify()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    /// Every entry header and data stream was readable.
    StructureValid,
    /// Embedded or container-native checksums were recomputed.
    ChecksumsVerified,
    /// Every entry path passed path-safety validation.
    PathSafety,
}

impl Check {
    /// Returns the snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StructureValid => "structure_valid",
            Self::ChecksumsVerified => "checksums_verified",
            Self::PathSafety => "path_safety",
        }
    }
}

/// Outcome of a `verify()` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// `true` when `errors` is empty.
    pub valid: bool,
    /// Entries read before verification finished or the stream broke.
    pub entry_count: usize,
    /// Entries whose checksum was recomputed and matched.
    pub checksums_verified: usize,
    /// Checks that were run.
    pub checks_performed: BTreeSet<Check>,
    /// Problems found.
    pub errors: Vec<EntryError>,
}
