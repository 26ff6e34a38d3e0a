//! Archive inspection without extraction.
//!
//! [`ArchiveScanner`] lists entries lazily; [`info`] aggregates a full scan;
//! the verification bookkeeping used by every handler lives in `verify`.

mod scanner;
pub(crate) mod verify;

use std::path::Path;

pub use scanner::ArchiveScanner;
pub use scanner::Entries;

use crate::Result;
use crate::config::ScanOptions;
use crate::formats::ArchiveFormat;
use crate::report::ArchiveInfo;

/// Aggregates an unfiltered scan into an [`ArchiveInfo`].
///
/// `entry_count` always equals the number of entries an unfiltered scan
/// yields. `compressed_size` is the size of the archive file.
///
/// # Errors
///
/// Returns an error if the archive cannot be opened or an entry header
/// cannot be read.
pub fn info(archive: &Path, format: ArchiveFormat) -> Result<ArchiveInfo> {
    let mut scanner = ArchiveScanner::open(archive, format, ScanOptions::default())?;

    let mut entry_count = 0;
    let mut total_size = 0u64;
    for entry in scanner.entries()? {
        let entry = entry?;
        entry_count += 1;
        total_size += entry.size;
    }

    let compressed_size = std::fs::metadata(archive)?.len();
    let info = ArchiveInfo::new(format, entry_count, total_size, compressed_size);
    tracing::debug!(
        archive = %archive.display(),
        entries = info.entry_count,
        total_size = info.total_size,
        compressed_size = info.compressed_size,
        "archive info"
    );
    Ok(info)
}
