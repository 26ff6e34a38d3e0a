//! Error types for archive operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `FulpackError`.
pub type Result<T> = std::result::Result<T, FulpackError>;

/// Errors that can occur while creating, extracting, scanning or verifying
/// archives.
#[derive(Error, Debug)]
pub enum FulpackError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive format is unsupported or unrecognized.
    #[error("unsupported archive format: {name}")]
    UnsupportedFormat {
        /// File name or format name that could not be mapped.
        name: String,
    },

    /// Path is degenerate (empty, `.`, root, or contains a null byte).
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath {
        /// The rejected path.
        path: String,
        /// Why the path was rejected.
        reason: &'static str,
    },

    /// Path traversal attempt detected.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The path that attempted traversal.
        path: String,
    },

    /// No source paths were given to `create()`.
    #[error("no source paths provided")]
    NoSources,

    /// Source path for archive creation does not exist.
    #[error("source not found: {path}")]
    SourceNotFound {
        /// The missing source path.
        path: PathBuf,
    },

    /// Sources violate a constraint of the target format.
    #[error("invalid source: {reason}")]
    InvalidSource {
        /// Description of the violated constraint.
        reason: String,
    },

    /// Archive file does not exist.
    #[error("archive not found: {path}")]
    ArchiveNotFound {
        /// The missing archive path.
        path: PathBuf,
    },

    /// Archive is corrupted or cannot be parsed.
    #[error("invalid archive: {0}")]
    InvalidArchive(String),

    /// Compression level outside 0-9.
    #[error("invalid compression level: {level} (must be 0-9)")]
    InvalidCompressionLevel {
        /// The rejected level.
        level: u8,
    },

    /// Extraction target already exists and the overwrite policy is `Error`.
    #[error("destination already exists: {path}")]
    DestinationExists {
        /// The existing path.
        path: PathBuf,
    },

    /// Entry type that is never materialized on disk.
    #[error("unsupported entry type {kind} for {path}")]
    UnsupportedEntryType {
        /// Entry path inside the archive.
        path: String,
        /// Entry type name.
        kind: String,
    },

    /// Entry limit was reached during extraction.
    #[error("entry limit of {max} reached")]
    EntryLimitReached {
        /// The configured limit.
        max: usize,
    },

    /// Checksum algorithm is not supported.
    #[error("unsupported checksum algorithm: {name}")]
    UnsupportedAlgorithm {
        /// The algorithm name as given.
        name: String,
    },

    /// Formatted checksum string is malformed.
    #[error("invalid checksum {value:?}: {reason}")]
    InvalidChecksum {
        /// The rejected checksum string.
        value: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Content does not match its recorded checksum.
    #[error("checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Entry or file the checksum belongs to.
        path: String,
        /// Recorded checksum.
        expected: String,
        /// Recomputed checksum.
        actual: String,
    },
}

impl FulpackError {
    /// Returns `true` if this error represents a security violation.
    ///
    /// # Examples
    ///
    /// ```
    /// use fulpack_core::FulpackError;
    ///
    /// let err = FulpackError::PathTraversal {
    ///     path: "../etc/passwd".to_string(),
    /// };
    /// assert!(err.is_security_violation());
    ///
    /// let err = FulpackError::NoSources;
    /// assert!(!err.is_security_violation());
    /// ```
    #[must_use]
    pub const fn is_security_violation(&self) -> bool {
        matches!(
            self,
            Self::PathTraversal { .. }
                | Self::InvalidPath { .. }
                | Self::UnsupportedEntryType { .. }
        )
    }

    /// Returns `true` if extraction can skip the offending entry and go on.
    ///
    /// Non-recoverable errors indicate the archive stream itself is unusable.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::PathTraversal { .. }
                | Self::InvalidPath { .. }
                | Self::UnsupportedEntryType { .. }
                | Self::DestinationExists { .. }
                | Self::ChecksumMismatch { .. }
                | Self::EntryLimitReached { .. }
        )
    }

    /// Returns a context string for this error, if available.
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        match self {
            Self::InvalidArchive(msg) => Some(msg),
            Self::InvalidSource { reason } => Some(reason),
            Self::InvalidPath { reason, .. } | Self::InvalidChecksum { reason, .. } => Some(reason),
            _ => None,
        }
    }
}
