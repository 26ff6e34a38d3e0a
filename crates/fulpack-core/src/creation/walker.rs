//! Source tree walking for archive creation.
//!
//! Sources are walked in lexicographic order so the same tree always
//! produces the same entry sequence. Symbolic links are followed: a link to
//! a file is stored as a regular file holding the target's content, and a
//! link to a directory is descended into. Link cycles are reported as
//! errors by the walker.

use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;

use walkdir::WalkDir;

use crate::FulpackError;
use crate::Result;
use crate::creation::filters;
use crate::types::entry_name;

/// Kind of a source entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Regular file (or symlink resolved to one).
    File,
    /// Directory (or symlink resolved to one).
    Directory,
}

/// A filesystem entry about to be written to an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Filesystem path to read from.
    pub path: PathBuf,
    /// `/`-separated name inside the archive.
    pub name: String,
    /// File or directory.
    pub kind: SourceKind,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Permission bits, if the platform has them.
    pub mode: Option<u32>,
    /// Modification time.
    pub modified: Option<SystemTime>,
}

/// Checks creation preconditions shared by all formats.
///
/// # Errors
///
/// Returns `NoSources` for an empty list and `SourceNotFound` for a missing
/// path.
pub fn check_sources<P: AsRef<Path>>(sources: &[P]) -> Result<()> {
    if sources.is_empty() {
        return Err(FulpackError::NoSources);
    }
    for source in sources {
        let path = source.as_ref();
        if !path.exists() {
            return Err(FulpackError::SourceNotFound {
                path: path.to_path_buf(),
            });
        }
    }
    Ok(())
}

/// Walks every source in order, yielding entries lazily.
///
/// A directory source is stored under its own name, so `dirA/file1.txt` is
/// archived as `dirA/file1.txt` regardless of where `dirA` lives.
pub fn walk_sources<'a, P: AsRef<Path>>(
    sources: &'a [P],
    exclude_patterns: &'a [String],
) -> impl Iterator<Item = Result<SourceEntry>> + 'a {
    sources
        .iter()
        .flat_map(move |source| walk_source(source.as_ref(), exclude_patterns))
}

fn walk_source<'a>(
    source: &'a Path,
    exclude_patterns: &'a [String],
) -> Box<dyn Iterator<Item = Result<SourceEntry>> + 'a> {
    let root_name = match root_name(source) {
        Ok(name) => name,
        Err(e) => return Box::new(std::iter::once(Err(e))),
    };

    let walker = WalkDir::new(source)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |entry| {
            entry
                .path()
                .strip_prefix(source)
                .map_or(true, |rel| !filters::is_excluded(rel, exclude_patterns))
        });

    Box::new(walker.filter_map(move |entry| match entry {
        Ok(entry) => build_entry(source, &root_name, &entry).transpose(),
        Err(e) => Some(Err(FulpackError::Io(std::io::Error::other(format!(
            "cannot walk {}: {e}",
            source.display()
        ))))),
    }))
}

fn root_name(source: &Path) -> Result<String> {
    if let Some(name) = source.file_name() {
        return Ok(name.to_string_lossy().into_owned());
    }
    let canonical = source.canonicalize()?;
    canonical
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| FulpackError::InvalidSource {
            reason: format!("cannot archive filesystem root {}", source.display()),
        })
}

fn build_entry(
    source: &Path,
    root_name: &str,
    entry: &walkdir::DirEntry,
) -> Result<Option<SourceEntry>> {
    let path = entry.path().to_path_buf();
    let metadata = entry.metadata().map_err(|e| {
        FulpackError::Io(std::io::Error::other(format!(
            "cannot read metadata for {}: {e}",
            path.display()
        )))
    })?;

    let kind = if metadata.is_dir() {
        SourceKind::Directory
    } else if metadata.is_file() {
        SourceKind::File
    } else {
        tracing::warn!(path = %path.display(), "skipping special file");
        return Ok(None);
    };

    let rel = path.strip_prefix(source).unwrap_or(Path::new(""));
    let name = if rel.as_os_str().is_empty() {
        root_name.to_string()
    } else {
        format!("{root_name}/{}", entry_name(rel))
    };

    Ok(Some(SourceEntry {
        size: if kind == SourceKind::File { metadata.len() } else { 0 },
        mode: mode_of(&metadata),
        modified: metadata.modified().ok(),
        path,
        name,
        kind,
    }))
}

#[cfg(unix)]
fn mode_of(metadata: &std::fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(metadata.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn mode_of(_metadata: &std::fs::Metadata) -> Option<u32> {
    None
}
