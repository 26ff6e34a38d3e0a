//! Cleanup guard for partially written files.

use std::path::PathBuf;

/// Removes a file on drop unless [`commit`](Self::commit) was called.
///
/// Guarantees a failed write (archive creation or single-entry extraction)
/// leaves no truncated file behind, on every exit path.
#[derive(Debug)]
pub struct PartialOutput {
    path: PathBuf,
    committed: bool,
}

impl PartialOutput {
    /// Guards `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            committed: false,
        }
    }

    /// Keeps the file.
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for PartialOutput {
    fn drop(&mut self) {
        if !self.committed && std::fs::remove_file(&self.path).is_ok() {
            tracing::debug!(path = %self.path.display(), "removed partial output");
        }
    }
}
