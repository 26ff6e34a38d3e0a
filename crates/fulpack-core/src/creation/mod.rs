//! Source collection for archive creation.
//!
//! Format handlers write the entries produced here; this module only decides
//! what goes into an archive and under which name.

pub mod filters;
pub mod walker;

use std::path::Path;
use std::path::PathBuf;

pub use walker::SourceEntry;
pub use walker::SourceKind;
pub use walker::check_sources;
pub use walker::walk_sources;

use crate::FulpackError;
use crate::Result;
use crate::formats::ArchiveFormat;

/// Checks creation preconditions for `format` before `output` is opened.
///
/// # Errors
///
/// Returns `NoSources` or `SourceNotFound` from [`check_sources`], and
/// `InvalidSource` when a single-entry format gets several sources or a
/// source is the output archive itself.
pub(crate) fn check_create(format: ArchiveFormat, sources: &[PathBuf], output: &Path) -> Result<()> {
    check_sources(sources)?;
    if !format.is_multi_entry() && sources.len() != 1 {
        return Err(FulpackError::InvalidSource {
            reason: format!(
                "{format} requires a single file source, got {} sources",
                sources.len()
            ),
        });
    }

    let Some(output) = canonical_output(output) else {
        return Ok(());
    };
    for source in sources {
        if source.canonicalize()? == output {
            return Err(FulpackError::InvalidSource {
                reason: format!("source is the output archive: {}", source.display()),
            });
        }
    }
    Ok(())
}

/// Canonical form of an output path that may not exist yet.
fn canonical_output(output: &Path) -> Option<PathBuf> {
    if let Ok(canonical) = output.canonicalize() {
        return Some(canonical);
    }
    let name = output.file_name()?;
    let parent = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    parent.canonicalize().ok().map(|dir| dir.join(name))
}

/// Walks `sources` for writing into `output`.
///
/// The archive being written is left out when it lies inside a source tree.
pub(crate) fn source_entries<'a>(
    sources: &'a [PathBuf],
    exclude_patterns: &'a [String],
    output: &Path,
) -> impl Iterator<Item = Result<SourceEntry>> + 'a {
    let output = output.canonicalize().ok();
    walk_sources(sources, exclude_patterns).filter(move |entry| match (entry, &output) {
        (Ok(entry), Some(output)) if entry.kind == SourceKind::File => {
            entry.path.canonicalize().ok().as_ref() != Some(output)
        }
        _ => true,
    })
}
