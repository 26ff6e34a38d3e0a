//! Core types for archive operations.
//!
//! This module provides validated path types and entry metadata:
//!
//! - [`SafePath`]: a relative entry path that cannot escape a root
//! - [`DestDir`]: a canonical extraction root
//! - [`ArchiveEntry`] / [`EntryKind`]: per-entry metadata produced by scans

mod dest_dir;
mod entry;
mod safe_path;

pub use dest_dir::DestDir;
pub use entry::ArchiveEntry;
pub use entry::EntryKind;
pub use safe_path::SafePath;
pub use safe_path::normalize_separators;

pub(crate) use entry::normalize_entry_path;
pub(crate) use safe_path::entry_name;
