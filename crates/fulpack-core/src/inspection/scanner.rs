//! Lazy, restartable entry scanning.

use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use crate::FulpackError;
use crate::Result;
use crate::config::ScanOptions;
use crate::formats::ArchiveFormat;
use crate::formats::gzip;
use crate::formats::tar as tar_format;
use crate::formats::zip as zip_format;
use crate::types::ArchiveEntry;

/// A scan over one archive.
///
/// Entries are read from the archive on demand, so memory use does not grow
/// with archive size. Each call to [`entries`](Self::entries) starts again
/// from the first entry.
///
/// # Examples
///
/// ```no_run
/// use fulpack_core::ScanOptions;
/// use fulpack_core::scan;
///
/// # fn main() -> Result<(), fulpack_core::FulpackError> {
/// let mut scanner = scan("backup.tar.gz", &ScanOptions::default())?;
/// for entry in scanner.entries()? {
///     let entry = entry?;
///     println!("{} ({} bytes)", entry.path, entry.size);
/// }
/// # Ok(())
/// # }
/// ```
pub struct ArchiveScanner {
    path: PathBuf,
    format: ArchiveFormat,
    options: ScanOptions,
    fresh: Option<ScanSource>,
    active: Option<ScanSource>,
}

enum ScanSource {
    Tar(tar_format::TarReader),
    Zip(zip_format::ZipReader),
    Gzip(ArchiveEntry),
}

impl ScanSource {
    fn open(path: &Path, format: ArchiveFormat) -> Result<Self> {
        Ok(match format {
            ArchiveFormat::Tar => Self::Tar(tar_format::open(path, false)?),
            ArchiveFormat::TarGz => Self::Tar(tar_format::open(path, true)?),
            ArchiveFormat::Zip => Self::Zip(zip_format::open(path)?),
            ArchiveFormat::Gzip => Self::Gzip(gzip::read_entry(path)?),
        })
    }
}

impl ArchiveScanner {
    /// Opens the archive. Fails only if it cannot be opened at all.
    pub fn open(path: &Path, format: ArchiveFormat, options: ScanOptions) -> Result<Self> {
        let fresh = ScanSource::open(path, format)?;
        Ok(Self {
            path: path.to_path_buf(),
            format,
            options,
            fresh: Some(fresh),
            active: None,
        })
    }

    /// The archive being scanned.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The archive's format.
    #[must_use]
    pub const fn format(&self) -> ArchiveFormat {
        self.format
    }

    /// Starts a pass over the entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive can no longer be opened.
    pub fn entries(&mut self) -> Result<Entries<'_>> {
        let source = match self.fresh.take() {
            Some(source) => source,
            None => ScanSource::open(&self.path, self.format)?,
        };

        let inner = match self.active.insert(source) {
            ScanSource::Tar(archive) => {
                let entries = archive.entries().map_err(|e| {
                    FulpackError::InvalidArchive(format!("failed to read TAR entries: {e}"))
                })?;
                Inner::Tar(entries)
            }
            ScanSource::Zip(archive) => Inner::Zip { archive, next: 0 },
            ScanSource::Gzip(entry) => Inner::Single(Some(entry.clone())),
        };

        Ok(Entries {
            inner,
            options: &self.options,
            yielded: 0,
            done: false,
        })
    }
}

impl std::fmt::Debug for ArchiveScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveScanner")
            .field("path", &self.path)
            .field("format", &self.format)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Iterator over the entries of one pass.
///
/// Applies the scan filters. After a read error the error is yielded once
/// and the iterator ends.
pub struct Entries<'a> {
    inner: Inner<'a>,
    options: &'a ScanOptions,
    yielded: usize,
    done: bool,
}

enum Inner<'a> {
    Tar(::tar::Entries<'a, Box<dyn Read>>),
    Zip {
        archive: &'a mut zip_format::ZipReader,
        next: usize,
    },
    Single(Option<ArchiveEntry>),
}

impl Inner<'_> {
    fn next_entry(&mut self) -> Option<Result<ArchiveEntry>> {
        match self {
            Self::Tar(entries) => {
                let entry = entries.next()?;
                Some(
                    entry
                        .map_err(|e| {
                            FulpackError::InvalidArchive(format!("failed to read TAR entry: {e}"))
                        })
                        .and_then(|mut entry| tar_format::read_entry(&mut entry)),
                )
            }
            Self::Zip { archive, next } => {
                if *next >= archive.len() {
                    return None;
                }
                let index = *next;
                *next += 1;
                Some(zip_format::read_entry(archive, index))
            }
            Self::Single(entry) => entry.take().map(Ok),
        }
    }
}

impl Iterator for Entries<'_> {
    type Item = Result<ArchiveEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Some(max) = self.options.max_entries
            && self.yielded >= max
        {
            self.done = true;
            return None;
        }

        loop {
            match self.inner.next_entry() {
                None => {
                    self.done = true;
                    return None;
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                Some(Ok(entry)) => {
                    if self.options.accepts(entry.kind, entry.depth()) {
                        self.yielded += 1;
                        return Some(Ok(entry));
                    }
                }
            }
        }
    }
}
