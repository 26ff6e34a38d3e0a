//! Supported digest algorithms.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::FulpackError;

/// Digest algorithm used for checksums.
///
/// The canonical name of each algorithm is the prefix of its formatted
/// checksum string (`xxh3-128:...`, `sha256:...`, `crc32:...`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Algorithm {
    /// XXH3 128-bit, fast and non-cryptographic.
    #[default]
    #[serde(rename = "xxh3-128")]
    Xxh3_128,
    /// SHA-256.
    #[serde(rename = "sha256")]
    Sha256,
    /// CRC-32 (IEEE), as used by ZIP and GZIP.
    #[serde(rename = "crc32")]
    Crc32,
}

impl Algorithm {
    /// All supported algorithms.
    pub const ALL: [Self; 3] = [Self::Xxh3_128, Self::Sha256, Self::Crc32];

    /// Returns the canonical algorithm name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Xxh3_128 => "xxh3-128",
            Self::Sha256 => "sha256",
            Self::Crc32 => "crc32",
        }
    }

    /// Returns the digest length in bytes.
    #[must_use]
    pub const fn digest_len(self) -> usize {
        match self {
            Self::Xxh3_128 => 16,
            Self::Sha256 => 32,
            Self::Crc32 => 4,
        }
    }

    /// Returns `true` for algorithms suitable against deliberate tampering.
    #[must_use]
    pub const fn is_cryptographic(self) -> bool {
        matches!(self, Self::Sha256)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = FulpackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "xxh3-128" | "xxh3_128" | "xxh3" => Ok(Self::Xxh3_128),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "crc32" | "crc-32" => Ok(Self::Crc32),
            _ => Err(FulpackError::UnsupportedAlgorithm {
                name: s.to_string(),
            }),
        }
    }
}
