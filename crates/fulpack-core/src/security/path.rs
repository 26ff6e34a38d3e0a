//! Path traversal validation.

use std::path::PathBuf;

use crate::Result;
use crate::types::DestDir;
use crate::types::SafePath;

/// Validates that an entry path cannot escape a destination root.
///
/// Delegates to [`SafePath::validate`].
///
/// # Errors
///
/// - `FulpackError::InvalidPath` for empty, `.`, root-only or null-byte paths
/// - `FulpackError::PathTraversal` for `..` segments, absolute paths and drive
///   prefixes
///
/// # Examples
///
/// ```
/// use fulpack_core::security::validate_path;
///
/// assert!(validate_path("foo/bar.txt").is_ok());
/// assert!(validate_path("../etc/passwd").is_err());
/// ```
pub fn validate_path(relative_path: &str) -> Result<SafePath> {
    SafePath::validate(relative_path)
}

/// Non-failing form of [`validate_path`].
///
/// # Examples
///
/// ```
/// use fulpack_core::security::is_safe_path;
///
/// assert!(is_safe_path("docs/readme.md"));
/// assert!(!is_safe_path("/etc/shadow"));
/// assert!(!is_safe_path(""));
/// ```
#[must_use]
pub fn is_safe_path(path: &str) -> bool {
    SafePath::validate(path).is_ok()
}

/// Validates an entry path and resolves it under `dest`.
pub fn resolve_entry_path(relative_path: &str, dest: &DestDir) -> Result<(SafePath, PathBuf)> {
    let safe = validate_path(relative_path)?;
    let target = dest.resolve(&safe)?;
    Ok((safe, target))
}
