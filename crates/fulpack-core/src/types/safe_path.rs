//! Validated relative entry path.

use std::path::Path;
use std::path::PathBuf;

use crate::FulpackError;
use crate::Result;

/// A relative archive entry path that cannot escape a destination root.
///
/// `SafePath` can only be obtained through [`SafePath::validate`]. Once
/// constructed it holds one or more normal components joined by `/`, with
/// no `.`, `..`, root or drive-prefix components.
///
/// # Examples
///
/// ```
/// use fulpack_core::types::SafePath;
///
/// let safe = SafePath::validate("dir\\sub/./file.txt")?;
/// assert_eq!(safe.as_str(), "dir/sub/file.txt");
///
/// assert!(SafePath::validate("../../evil").is_err());
/// # Ok::<(), fulpack_core::FulpackError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SafePath(String);

impl SafePath {
    /// Validates a raw entry path.
    ///
    /// # Validation Steps
    ///
    /// 1. Normalize `\` to `/`
    /// 2. Reject empty, `.`, root-only and null-byte paths (`InvalidPath`)
    /// 3. Reject absolute paths and drive prefixes (`PathTraversal`)
    /// 4. Reject any `..` segment (`PathTraversal`)
    /// 5. Drop empty and `.` segments
    pub fn validate(raw: &str) -> Result<Self> {
        let normalized = normalize_separators(raw);

        if normalized.is_empty() {
            return Err(invalid(raw, "empty path"));
        }
        if normalized.contains('\0') {
            return Err(invalid(raw, "path contains null bytes"));
        }
        if normalized.chars().all(|c| c == '/') {
            return Err(invalid(raw, "path is the root directory"));
        }
        if normalized.starts_with('/') || has_drive_prefix(&normalized) {
            return Err(FulpackError::PathTraversal {
                path: raw.to_string(),
            });
        }

        let mut segments = Vec::new();
        for segment in normalized.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    return Err(FulpackError::PathTraversal {
                        path: raw.to_string(),
                    });
                }
                other => segments.push(other),
            }
        }

        if segments.is_empty() {
            return Err(invalid(raw, "path refers to the current directory"));
        }

        Ok(Self(segments.join("/")))
    }

    /// Returns the normalized path with `/` separators.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the path as a platform `PathBuf`.
    #[must_use]
    pub fn to_path_buf(&self) -> PathBuf {
        self.0.split('/').collect()
    }

    /// Returns the number of components.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.split('/').count()
    }
}

impl AsRef<str> for SafePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SafePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Replaces `\` separators with `/`.
#[must_use]
pub fn normalize_separators(raw: &str) -> String {
    raw.replace('\\', "/")
}

/// Converts a relative filesystem path to a `/`-separated entry name.
pub(crate) fn entry_name(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

fn invalid(raw: &str, reason: &'static str) -> FulpackError {
    FulpackError::InvalidPath {
        path: raw.to_string(),
        reason,
    }
}
