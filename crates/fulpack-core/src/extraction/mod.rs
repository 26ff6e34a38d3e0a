//! Safe extraction shared by all formats.
//!
//! Format handlers decode entries and feed them to an [`ExtractSession`],
//! which validates paths, enforces the overwrite and entry-limit policies
//! and writes files.

mod session;

pub(crate) use session::ExtractSession;
pub(crate) use session::Flow;
pub(crate) use session::PendingEntry;
