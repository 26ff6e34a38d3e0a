//! Options for archive operations.
//!
//! Every operation takes an explicit options struct with named fields.
//! All structs implement `Default` and deserialize with missing fields
//! falling back to those defaults, so they can be loaded from configuration
//! files by the caller.

use serde::Deserialize;
use serde::Serialize;

use crate::FulpackError;
use crate::Result;
use crate::checksum::Algorithm;
use crate::formats::ArchiveFormat;
use crate::types::EntryKind;

/// Default deflate/gzip compression level.
pub const DEFAULT_COMPRESSION_LEVEL: u8 = 6;

/// Options for `create()`.
///
/// # Examples
///
/// ```
/// use fulpack_core::CreateOptions;
/// use fulpack_core::checksum::Algorithm;
///
/// let options = CreateOptions::default()
///     .with_compression_level(9)
///     .with_checksum_algorithm(Algorithm::Sha256);
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateOptions {
    /// Archive format to create.
    ///
    /// `None` means detect from the output file name. Default: `None`.
    pub format: Option<ArchiveFormat>,

    /// Compression level, 0 (store) to 9 (best).
    ///
    /// Ignored for plain TAR. Default: 6.
    pub compression_level: u8,

    /// Algorithm for checksums embedded at creation time.
    ///
    /// Default: `xxh3-128`.
    pub checksum_algorithm: Algorithm,

    /// Embed a per-file checksum as a pax record in TAR archives.
    ///
    /// ZIP and GZIP always carry their native CRC-32. Default: `true`.
    pub embed_checksums: bool,

    /// Store source permission bits and modification times.
    ///
    /// When `false`, files are stored as 0o644 and directories as 0o755.
    /// Default: `true`.
    pub preserve_permissions: bool,

    /// Name patterns to leave out: exact component (`.git`), prefix
    /// (`tmp*`) or suffix (`*.log`).
    ///
    /// Default: empty.
    pub exclude_patterns: Vec<String>,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            format: None,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            checksum_algorithm: Algorithm::default(),
            embed_checksums: true,
            preserve_permissions: true,
            exclude_patterns: Vec::new(),
        }
    }
}

impl CreateOptions {
    /// Creates options with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the archive format explicitly.
    #[must_use]
    pub fn with_format(mut self, format: Option<ArchiveFormat>) -> Self {
        self.format = format;
        self
    }

    /// Sets the compression level. Checked by [`validate`](Self::validate).
    #[must_use]
    pub fn with_compression_level(mut self, level: u8) -> Self {
        self.compression_level = level;
        self
    }

    /// Sets the embedded checksum algorithm.
    #[must_use]
    pub fn with_checksum_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.checksum_algorithm = algorithm;
        self
    }

    /// Sets whether TAR entries carry embedded checksums.
    #[must_use]
    pub fn with_embed_checksums(mut self, embed: bool) -> Self {
        self.embed_checksums = embed;
        self
    }

    /// Sets whether permissions and timestamps are stored.
    #[must_use]
    pub fn with_preserve_permissions(mut self, preserve: bool) -> Self {
        self.preserve_permissions = preserve;
        self
    }

    /// Sets the exclude patterns.
    #[must_use]
    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCompressionLevel` if the level is above 9.
    pub fn validate(&self) -> Result<()> {
        if self.compression_level > 9 {
            return Err(FulpackError::InvalidCompressionLevel {
                level: self.compression_level,
            });
        }
        Ok(())
    }
}

/// What to do when an extraction target already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverwritePolicy {
    /// Record a per-entry error and leave the existing file untouched.
    #[default]
    Error,
    /// Leave the existing file untouched and count the entry as skipped.
    Skip,
    /// Replace the existing file.
    Overwrite,
}

/// What happens to entries past `max_entries` during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryLimitPolicy {
    /// Stop reading the archive; remaining entries are dropped without being
    /// counted.
    #[default]
    Truncate,
    /// Keep reading headers without writing; every remaining entry is
    /// recorded as an error.
    Error,
}

/// Options for `extract()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Policy for targets that already exist. Default: `Error`.
    pub overwrite: OverwritePolicy,

    /// Maximum number of entries to process. Default: `None` (unlimited).
    pub max_entries: Option<usize>,

    /// Policy for entries beyond `max_entries`. Default: `Truncate`.
    pub entry_limit: EntryLimitPolicy,

    /// Apply stored permission bits (masked to 0o777). Default: `true`.
    pub preserve_permissions: bool,

    /// Recompute embedded TAR checksums while writing. A mismatch removes
    /// the written file and records an error. Default: `true`.
    pub verify_checksums: bool,

    /// Abort on the first per-entry failure instead of recording it.
    /// Default: `false`.
    pub strict: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            overwrite: OverwritePolicy::default(),
            max_entries: None,
            entry_limit: EntryLimitPolicy::default(),
            preserve_permissions: true,
            verify_checksums: true,
            strict: false,
        }
    }
}

impl ExtractOptions {
    /// Creates options with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the overwrite policy.
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: OverwritePolicy) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Sets the entry limit.
    #[must_use]
    pub fn with_max_entries(mut self, max_entries: Option<usize>) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Sets the entry limit policy.
    #[must_use]
    pub fn with_entry_limit(mut self, policy: EntryLimitPolicy) -> Self {
        self.entry_limit = policy;
        self
    }

    /// Sets whether stored permissions are applied.
    #[must_use]
    pub fn with_preserve_permissions(mut self, preserve: bool) -> Self {
        self.preserve_permissions = preserve;
        self
    }

    /// Sets whether embedded checksums are verified while writing.
    #[must_use]
    pub fn with_verify_checksums(mut self, verify: bool) -> Self {
        self.verify_checksums = verify;
        self
    }

    /// Sets strict mode.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// Options for `scan()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// Only yield entries of these kinds. Default: `None` (all kinds).
    pub entry_kinds: Option<Vec<EntryKind>>,

    /// Only yield entries with at most this many path components.
    /// Default: `None`.
    pub max_depth: Option<usize>,

    /// Stop after yielding this many entries. Default: `None`.
    pub max_entries: Option<usize>,
}

impl ScanOptions {
    /// Creates options with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the scan to the given entry kinds.
    #[must_use]
    pub fn with_entry_kinds(mut self, kinds: Vec<EntryKind>) -> Self {
        self.entry_kinds = Some(kinds);
        self
    }

    /// Sets the maximum path depth.
    #[must_use]
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Sets the maximum number of entries yielded.
    #[must_use]
    pub fn with_max_entries(mut self, max_entries: Option<usize>) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub(crate) fn accepts(&self, kind: EntryKind, depth: usize) -> bool {
        if let Some(kinds) = &self.entry_kinds
            && !kinds.contains(&kind)
        {
            return false;
        }
        self.max_depth.is_none_or(|max| depth <= max)
    }
}

/// Options for `verify()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyOptions {
    /// Recompute embedded and container-native checksums. Default: `true`.
    pub verify_checksums: bool,

    /// Run every entry path through the path-safety validator.
    /// Default: `true`.
    pub check_paths: bool,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            verify_checksums: true,
            check_paths: true,
        }
    }
}
