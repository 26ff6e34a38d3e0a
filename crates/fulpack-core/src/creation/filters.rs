//! Exclude-pattern matching for archive creation.
//!
//! A pattern is tested against every component of a source-relative path,
//! so excluding a directory name drops its whole subtree.

use std::path::Path;

/// Checks whether a source-relative path matches any exclude pattern.
///
/// # Examples
///
/// ```
/// use fulpack_core::creation::filters;
/// use std::path::Path;
///
/// let patterns = vec![".git".to_string(), "*.log".to_string()];
/// assert!(filters::is_excluded(Path::new("src/.git/HEAD"), &patterns));
/// assert!(filters::is_excluded(Path::new("debug.log"), &patterns));
/// assert!(!filters::is_excluded(Path::new("src/main.rs"), &patterns));
/// ```
#[must_use]
pub fn is_excluded(path: &Path, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| matches_pattern(path, pattern))
}

/// Matches one pattern against each component of `path`.
///
/// `name` matches a component exactly, `name*` matches by prefix and
/// `*name` by suffix. A bare `*` matches everything.
#[must_use]
pub fn matches_pattern(path: &Path, pattern: &str) -> bool {
    let pattern = Pattern::parse(pattern);
    path.iter()
        .filter_map(|component| component.to_str())
        .any(|name| pattern.matches(name))
}

#[derive(Debug, Clone, Copy)]
enum Pattern<'p> {
    Exact(&'p str),
    Prefix(&'p str),
    Suffix(&'p str),
}

impl<'p> Pattern<'p> {
    fn parse(raw: &'p str) -> Self {
        if let Some(prefix) = raw.strip_suffix('*') {
            Self::Prefix(prefix)
        } else if let Some(suffix) = raw.strip_prefix('*') {
            Self::Suffix(suffix)
        } else {
            Self::Exact(raw)
        }
    }

    fn matches(self, name: &str) -> bool {
        match self {
            Self::Exact(exact) => name == exact,
            Self::Prefix(prefix) => name.starts_with(prefix),
            Self::Suffix(suffix) => name.ends_with(suffix),
        }
    }
}
