//! Canonical extraction root.

use std::path::Path;
use std::path::PathBuf;

use super::SafePath;
use crate::FulpackError;
use crate::Result;

/// A canonicalized destination directory for extraction.
///
/// All entry paths are resolved against this root with [`DestDir::resolve`],
/// which re-checks the nearest existing ancestor on disk so that a
/// pre-existing symlink inside the destination cannot redirect writes
/// outside of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestDir(PathBuf);

impl DestDir {
    /// Creates the directory if needed and canonicalizes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the path exists but is not a directory, or if it
    /// cannot be created or canonicalized.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if path.exists() && !path.is_dir() {
            return Err(FulpackError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("destination is not a directory: {}", path.display()),
            )));
        }

        std::fs::create_dir_all(&path)?;

        let canonical = path.canonicalize().map_err(|e| {
            FulpackError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to canonicalize {}: {e}", path.display()),
            ))
        })?;

        Ok(Self(canonical))
    }

    /// Returns the canonical root.
    #[inline]
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Joins a validated path to the root without touching the filesystem.
    #[must_use]
    pub fn join(&self, path: &SafePath) -> PathBuf {
        self.0.join(path.to_path_buf())
    }

    /// Joins a validated path and confirms the result stays under the root.
    ///
    /// The nearest existing ancestor of the target is canonicalized and must
    /// be a descendant of (or equal to) the root.
    pub fn resolve(&self, path: &SafePath) -> Result<PathBuf> {
        let target = self.join(path);

        let mut ancestor = target.parent();
        while let Some(dir) = ancestor {
            if dir.symlink_metadata().is_ok() {
                let canonical = dir.canonicalize()?;
                if !canonical.starts_with(&self.0) {
                    return Err(FulpackError::PathTraversal {
                        path: path.as_str().to_string(),
                    });
                }
                break;
            }
            ancestor = dir.parent();
        }

        Ok(target)
    }
}
