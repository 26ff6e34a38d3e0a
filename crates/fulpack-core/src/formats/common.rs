//! Helpers shared by the format handlers.

use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;
use std::time::SystemTime;

use crate::FulpackError;
use crate::Result;

/// Opens an archive for reading.
///
/// A missing file becomes `ArchiveNotFound`; any other failure stays `Io`.
pub(crate) fn open_archive(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            FulpackError::ArchiveNotFound {
                path: path.to_path_buf(),
            }
        } else {
            FulpackError::Io(e)
        }
    })
}

/// Converts seconds since the Unix epoch. Zero means "unknown".
pub(crate) fn from_unix_secs(secs: u64) -> Option<SystemTime> {
    if secs == 0 {
        return None;
    }
    SystemTime::UNIX_EPOCH.checked_add(Duration::from_secs(secs))
}

/// Seconds since the Unix epoch, clamped at zero.
pub(crate) fn to_unix_secs(time: SystemTime) -> u64 {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}
