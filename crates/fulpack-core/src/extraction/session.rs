//! Per-call extraction state shared by every format.
//!
//! Each entry moves through `pending -> validated -> written`, or ends as
//! skipped-unsafe or failed-io. Only the written state touches the
//! filesystem, and a failed write never leaves a partial file behind.

use std::fs;
use std::fs::OpenOptions;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use crate::FulpackError;
use crate::Result;
use crate::checksum;
use crate::checksum::Digest;
use crate::config::EntryLimitPolicy;
use crate::config::ExtractOptions;
use crate::config::OverwritePolicy;
use crate::io::HashingReader;
use crate::io::PartialOutput;
use crate::report::EntryError;
use crate::report::ExtractResult;
use crate::security::permissions::apply_mode;
use crate::security::resolve_entry_path;
use crate::types::DestDir;
use crate::types::EntryKind;
use crate::types::SafePath;

/// Whether the caller should keep reading the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Stop,
}

/// Header data of the entry about to be extracted.
#[derive(Debug, Clone)]
pub(crate) struct PendingEntry<'p> {
    pub path: &'p str,
    pub kind: EntryKind,
    pub mode: Option<u32>,
    pub checksum: Option<Digest>,
}

impl<'p> PendingEntry<'p> {
    pub fn new(path: &'p str, kind: EntryKind) -> Self {
        Self {
            path,
            kind,
            mode: None,
            checksum: None,
        }
    }

    pub fn with_mode(mut self, mode: Option<u32>) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_checksum(mut self, checksum: Option<Digest>) -> Self {
        self.checksum = checksum;
        self
    }
}

pub(crate) struct ExtractSession<'o> {
    dest: DestDir,
    options: &'o ExtractOptions,
    result: ExtractResult,
    seen: usize,
    dir_modes: Vec<(PathBuf, u32)>,
}

impl<'o> ExtractSession<'o> {
    /// Prepares the destination directory, creating it if missing.
    pub fn new(dest: &Path, options: &'o ExtractOptions) -> Result<Self> {
        Ok(Self {
            dest: DestDir::new(dest)?,
            options,
            result: ExtractResult::default(),
            seen: 0,
            dir_modes: Vec::new(),
        })
    }

    /// Processes one entry. `data` is only read for regular files.
    pub fn process<R: Read>(&mut self, entry: PendingEntry<'_>, data: R) -> Result<Flow> {
        if let Some(max) = self.options.max_entries
            && self.seen >= max
        {
            match self.options.entry_limit {
                EntryLimitPolicy::Truncate => {
                    tracing::debug!(max, "entry limit reached, stopping");
                    return Ok(Flow::Stop);
                }
                EntryLimitPolicy::Error => {
                    self.record(entry.path, FulpackError::EntryLimitReached { max })?;
                    return Ok(Flow::Continue);
                }
            }
        }
        self.seen += 1;

        let (safe, target) = match resolve_entry_path(entry.path, &self.dest) {
            Ok(resolved) => resolved,
            Err(e) => {
                self.record(entry.path, e)?;
                return Ok(Flow::Continue);
            }
        };

        let outcome = match entry.kind {
            EntryKind::Directory => self.create_dir(&target, entry.mode),
            EntryKind::File => self.write_file(&safe, &target, data, &entry),
            EntryKind::Symlink | EntryKind::Other => Err(FulpackError::UnsupportedEntryType {
                path: entry.path.to_string(),
                kind: entry.kind.to_string(),
            }),
        };

        match outcome {
            Ok(Written::Yes) => {
                tracing::debug!(path = %safe, kind = %entry.kind, "extracted entry");
                self.result.extracted_count += 1;
            }
            Ok(Written::Skipped) => {
                tracing::debug!(path = %safe, "target exists, skipped");
                self.result.skipped_count += 1;
            }
            Err(e) => self.record(entry.path, e)?,
        }
        Ok(Flow::Continue)
    }

    /// Records a failure for an entry whose data could not be opened.
    pub fn record_entry_error(&mut self, path: &str, err: FulpackError) -> Result<()> {
        self.record(path, err)
    }

    /// Records a failure that is not tied to a single well-formed entry,
    /// such as a corrupted stream.
    pub fn record_stream_error(&mut self, archive: &Path, err: FulpackError) -> Result<()> {
        self.record(&archive.display().to_string(), err)
    }

    /// Applies deferred directory modes and returns the tallies.
    pub fn finish(mut self) -> ExtractResult {
        // Deepest first so a read-only parent does not block its children.
        for (dir, mode) in self.dir_modes.drain(..).rev() {
            if let Err(e) = apply_mode(&dir, mode) {
                tracing::warn!(path = %dir.display(), error = %e, "failed to set directory mode");
            }
        }
        self.result
    }

    fn record(&mut self, path: &str, err: FulpackError) -> Result<()> {
        if self.options.strict {
            return Err(err);
        }
        tracing::warn!(path, error = %err, "entry not extracted");
        self.result.error_count += 1;
        self.result.errors.push(EntryError::new(path, &err));
        Ok(())
    }

    fn create_dir(&mut self, target: &Path, mode: Option<u32>) -> Result<Written> {
        if let Ok(meta) = target.symlink_metadata()
            && !meta.is_dir()
        {
            return Err(FulpackError::DestinationExists {
                path: target.to_path_buf(),
            });
        }
        fs::create_dir_all(target)?;
        if self.options.preserve_permissions
            && let Some(mode) = mode
        {
            self.dir_modes.push((target.to_path_buf(), mode));
        }
        Ok(Written::Yes)
    }

    fn write_file<R: Read>(
        &self,
        safe: &SafePath,
        target: &Path,
        data: R,
        entry: &PendingEntry<'_>,
    ) -> Result<Written> {
        if let Ok(meta) = target.symlink_metadata() {
            match self.options.overwrite {
                OverwritePolicy::Skip => return Ok(Written::Skipped),
                OverwritePolicy::Overwrite if !meta.is_dir() => fs::remove_file(target)?,
                OverwritePolicy::Error | OverwritePolicy::Overwrite => {
                    return Err(FulpackError::DestinationExists {
                        path: target.to_path_buf(),
                    });
                }
            }
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(target)?;
        let guard = PartialOutput::new(target);

        let expected = entry
            .checksum
            .as_ref()
            .filter(|_| self.options.verify_checksums);
        match expected {
            Some(expected) => {
                let mut reader = HashingReader::new(data, expected.algorithm());
                std::io::copy(&mut reader, &mut file)?;
                drop(file);
                let (actual, _) = reader.finish();
                checksum::ensure_match(safe.as_str(), expected, &actual)?;
            }
            None => {
                let mut data = data;
                std::io::copy(&mut data, &mut file)?;
                drop(file);
            }
        }

        if self.options.preserve_permissions
            && let Some(mode) = entry.mode
        {
            apply_mode(target, mode)?;
        }

        guard.commit();
        Ok(Written::Yes)
    }
}

enum Written {
    Yes,
    Skipped,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::checksum::Algorithm;
    use tempfile::TempDir;

    fn file<'p>(path: &'p str) -> PendingEntry<'p> {
        PendingEntry::new(path, EntryKind::File)
    }

    #[test]
    fn test_writes_file_and_dir() {
        let temp = TempDir::new().unwrap();
        let options = ExtractOptions::default();
        let mut session = ExtractSession::new(temp.path(), &options).unwrap();

        let dir = PendingEntry::new("dirA", EntryKind::Directory);
        session.process(dir, std::io::empty()).unwrap();
        session.process(file("dirA/a.txt"), &b"Hello"[..]).unwrap();
        let result = session.finish();

        assert_eq!(result.extracted_count, 2);
        assert_eq!(
            fs::read_to_string(temp.path().join("dirA/a.txt")).unwrap(),
            "Hello"
        );
    }

    #[test]
    fn test_traversal_recorded_not_written() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out");
        let options = ExtractOptions::default();
        let mut session = ExtractSession::new(&dest, &options).unwrap();

        let flow = session.process(file("../../evil"), &b"x"[..]).unwrap();
        assert_eq!(flow, Flow::Continue);
        let result = session.finish();

        assert_eq!(result.error_count, 1);
        assert_eq!(result.errors[0].path, "../../evil");
        assert!(!temp.path().join("evil").exists());
    }

    #[test]
    fn test_strict_aborts() {
        let temp = TempDir::new().unwrap();
        let options = ExtractOptions::default().with_strict(true);
        let mut session = ExtractSession::new(temp.path(), &options).unwrap();
        let err = session.process(file("/etc/passwd"), &b"x"[..]).unwrap_err();
        assert!(err.is_security_violation());
    }

    #[test]
    fn test_overwrite_policies() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "old").unwrap();

        let options = ExtractOptions::default();
        let mut session = ExtractSession::new(temp.path(), &options).unwrap();
        session.process(file("a.txt"), &b"new"[..]).unwrap();
        let result = session.finish();
        assert_eq!(result.error_count, 1);
        assert_eq!(fs::read_to_string(temp.path().join("a.txt")).unwrap(), "old");

        let options = ExtractOptions::default().with_overwrite(OverwritePolicy::Skip);
        let mut session = ExtractSession::new(temp.path(), &options).unwrap();
        session.process(file("a.txt"), &b"new"[..]).unwrap();
        let result = session.finish();
        assert_eq!(result.skipped_count, 1);
        assert_eq!(fs::read_to_string(temp.path().join("a.txt")).unwrap(), "old");

        let options = ExtractOptions::default().with_overwrite(OverwritePolicy::Overwrite);
        let mut session = ExtractSession::new(temp.path(), &options).unwrap();
        session.process(file("a.txt"), &b"new"[..]).unwrap();
        let result = session.finish();
        assert_eq!(result.extracted_count, 1);
        assert_eq!(fs::read_to_string(temp.path().join("a.txt")).unwrap(), "new");
    }

    #[test]
    fn test_checksum_mismatch_removes_file() {
        let temp = TempDir::new().unwrap();
        let options = ExtractOptions::default();
        let mut session = ExtractSession::new(temp.path(), &options).unwrap();

        let wrong = checksum::hash(b"other", Algorithm::Sha256);
        let entry = file("a.txt").with_checksum(Some(wrong));
        session.process(entry, &b"content"[..]).unwrap();
        let result = session.finish();

        assert_eq!(result.error_count, 1);
        assert!(result.errors[0].reason.contains("checksum mismatch"));
        assert!(!temp.path().join("a.txt").exists());
    }

    #[test]
    fn test_entry_limit_truncate() {
        let temp = TempDir::new().unwrap();
        let options = ExtractOptions::default().with_max_entries(Some(1));
        let mut session = ExtractSession::new(temp.path(), &options).unwrap();

        assert_eq!(session.process(file("a"), &b"1"[..]).unwrap(), Flow::Continue);
        assert_eq!(session.process(file("b"), &b"2"[..]).unwrap(), Flow::Stop);
        let result = session.finish();
        assert_eq!(result.extracted_count, 1);
        assert_eq!(result.error_count, 0);
    }

    #[test]
    fn test_entry_limit_error() {
        let temp = TempDir::new().unwrap();
        let options = ExtractOptions::default()
            .with_max_entries(Some(1))
            .with_entry_limit(EntryLimitPolicy::Error);
        let mut session = ExtractSession::new(temp.path(), &options).unwrap();

        session.process(file("a"), &b"1"[..]).unwrap();
        assert_eq!(session.process(file("b"), &b"2"[..]).unwrap(), Flow::Continue);
        session.process(file("c"), &b"3"[..]).unwrap();
        let result = session.finish();
        assert_eq!(result.extracted_count, 1);
        assert_eq!(result.error_count, 2);
        assert!(!temp.path().join("b").exists());
    }

    #[test]
    fn test_symlink_entry_rejected() {
        let temp = TempDir::new().unwrap();
        let options = ExtractOptions::default();
        let mut session = ExtractSession::new(temp.path(), &options).unwrap();
        let link = PendingEntry::new("link", EntryKind::Symlink);
        session.process(link, std::io::empty()).unwrap();
        let result = session.finish();
        assert_eq!(result.error_count, 1);
        assert!(!temp.path().join("link").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_mode_masked() {
        use std::os::unix::fs::PermissionsExt;
        let temp = TempDir::new().unwrap();
        let options = ExtractOptions::default();
        let mut session = ExtractSession::new(temp.path(), &options).unwrap();
        let entry = file("suid").with_mode(Some(0o4755));
        session.process(entry, &b"#!"[..]).unwrap();
        session.finish();
        let mode = fs::metadata(temp.path().join("suid")).unwrap().permissions().mode();
        assert_eq!(mode & 0o7777, 0o755);
    }
}
