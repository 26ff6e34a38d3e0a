//! Archive format detection.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::FulpackError;
use crate::Result;

/// Supported archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArchiveFormat {
    /// Tar archive (uncompressed, ustar/pax layout).
    #[serde(rename = "tar")]
    Tar,
    /// Gzip-compressed tar archive.
    #[serde(rename = "tar.gz")]
    TarGz,
    /// ZIP archive.
    #[serde(rename = "zip")]
    Zip,
    /// Single gzip-compressed file.
    #[serde(rename = "gzip")]
    Gzip,
}

impl ArchiveFormat {
    /// All supported formats.
    pub const ALL: [Self; 4] = [Self::Tar, Self::TarGz, Self::Zip, Self::Gzip];

    /// Returns the canonical format name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
            Self::Zip => "zip",
            Self::Gzip => "gzip",
        }
    }

    /// Returns the conventional file extension, without the leading dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
            Self::Zip => "zip",
            Self::Gzip => "gz",
        }
    }

    /// Returns `true` if the container stores more than one entry.
    #[must_use]
    pub const fn is_multi_entry(self) -> bool {
        !matches!(self, Self::Gzip)
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArchiveFormat {
    type Err = FulpackError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tar" => Ok(Self::Tar),
            "tar.gz" | "tgz" | "tar_gz" | "targz" => Ok(Self::TarGz),
            "zip" => Ok(Self::Zip),
            "gzip" | "gz" => Ok(Self::Gzip),
            _ => Err(FulpackError::UnsupportedFormat {
                name: s.to_string(),
            }),
        }
    }
}

/// Detects the archive format from a file name's suffix chain.
///
/// `.tar.gz` and `.tgz` are checked before `.tar`, and `.gz` last, so a
/// compressed tarball is never mistaken for a single-file gzip. Matching is
/// case-insensitive.
///
/// # Errors
///
/// Returns `UnsupportedFormat` if no suffix matches.
///
/// # Examples
///
/// ```
/// use fulpack_core::formats::ArchiveFormat;
/// use fulpack_core::formats::detect_format;
/// use std::path::Path;
///
/// assert_eq!(detect_format(Path::new("out.tar.gz"))?, ArchiveFormat::TarGz);
/// assert_eq!(detect_format(Path::new("notes.txt.gz"))?, ArchiveFormat::Gzip);
/// # Ok::<(), fulpack_core::FulpackError>(())
/// ```
pub fn detect_format(path: &Path) -> Result<ArchiveFormat> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .ok_or_else(|| FulpackError::UnsupportedFormat {
            name: path.display().to_string(),
        })?;

    let format = if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        ArchiveFormat::TarGz
    } else if name.ends_with(".tar") {
        ArchiveFormat::Tar
    } else if name.ends_with(".zip") {
        ArchiveFormat::Zip
    } else if name.ends_with(".gz") {
        ArchiveFormat::Gzip
    } else {
        return Err(FulpackError::UnsupportedFormat {
            name: path.display().to_string(),
        });
    };

    tracing::debug!(path = %path.display(), %format, "detected archive format");
    Ok(format)
}
