//! Capability set shared by every format handler.

use std::path::Path;
use std::path::PathBuf;

use crate::Result;
use crate::config::CreateOptions;
use crate::config::ExtractOptions;
use crate::config::ScanOptions;
use crate::config::VerifyOptions;
use crate::formats::ArchiveFormat;
use crate::inspection;
use crate::inspection::ArchiveScanner;
use crate::report::ArchiveInfo;
use crate::report::ExtractResult;
use crate::report::ValidationResult;

/// Operations a container format supports.
///
/// Handlers are stateless: every call opens its own files and releases them
/// before returning, so a single handler can serve concurrent calls on
/// independent archives.
pub trait ArchiveHandler: Send + Sync + std::fmt::Debug {
    /// The format this handler speaks.
    fn format(&self) -> ArchiveFormat;

    /// Writes `sources` into a new archive at `output`.
    ///
    /// A failed call removes the partially written archive.
    fn create(
        &self,
        sources: &[PathBuf],
        output: &Path,
        options: &CreateOptions,
    ) -> Result<ArchiveInfo>;

    /// Extracts every entry under `dest`.
    ///
    /// Only failure to open the archive or the destination is fatal; entry
    /// failures are recorded in the result.
    fn extract(
        &self,
        archive: &Path,
        dest: &Path,
        options: &ExtractOptions,
    ) -> Result<ExtractResult>;

    /// Checks structure, embedded checksums and entry paths without writing
    /// anything.
    fn verify(&self, archive: &Path, options: &VerifyOptions) -> Result<ValidationResult>;

    /// Opens a restartable scan over the archive's entries.
    fn scan(&self, archive: &Path, options: &ScanOptions) -> Result<ArchiveScanner> {
        ArchiveScanner::open(archive, self.format(), options.clone())
    }

    /// Summarizes the archive from a full scan.
    fn info(&self, archive: &Path) -> Result<ArchiveInfo> {
        inspection::info(archive, self.format())
    }
}
