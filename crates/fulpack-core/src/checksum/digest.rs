//! Computed digests and their canonical string form.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use super::Algorithm;
use crate::FulpackError;
use crate::Result;

/// A computed digest tagged with the algorithm that produced it.
///
/// The canonical string form is `algorithm:lowercase-hex`, for example
/// `crc32:cbf43926`. Parsing accepts upper-case hex and normalizes it.
///
/// # Examples
///
/// ```
/// use fulpack_core::checksum::Algorithm;
/// use fulpack_core::checksum::Digest;
///
/// let digest: Digest = "CRC32:CBF43926".parse()?;
/// assert_eq!(digest.algorithm(), Algorithm::Crc32);
/// assert_eq!(digest.to_string(), "crc32:cbf43926");
/// # Ok::<(), fulpack_core::FulpackError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Digest {
    algorithm: Algorithm,
    bytes: Vec<u8>,
}

impl Digest {
    /// Creates a digest from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidChecksum` if the length does not match the algorithm.
    pub fn new(algorithm: Algorithm, bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() != algorithm.digest_len() {
            return Err(FulpackError::InvalidChecksum {
                value: format!("{algorithm}:{}", hex::encode(&bytes)),
                reason: "digest length does not match algorithm",
            });
        }
        Ok(Self { algorithm, bytes })
    }

    /// Creates a CRC-32 digest from its integer value.
    #[must_use]
    pub fn from_crc32(value: u32) -> Self {
        Self {
            algorithm: Algorithm::Crc32,
            bytes: value.to_be_bytes().to_vec(),
        }
    }

    pub(crate) fn from_parts_unchecked(algorithm: Algorithm, bytes: Vec<u8>) -> Self {
        debug_assert_eq!(bytes.len(), algorithm.digest_len());
        Self { algorithm, bytes }
    }

    /// Returns the algorithm.
    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Returns the raw digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the lowercase hex digest.
    #[must_use]
    pub fn hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Returns the canonical `algorithm:hex` string.
    #[must_use]
    pub fn formatted(&self) -> String {
        format!("{}:{}", self.algorithm, self.hex())
    }

    /// Parses a formatted checksum string.
    ///
    /// # Errors
    ///
    /// Returns `InvalidChecksum` for a missing prefix or bad hex, and
    /// `UnsupportedAlgorithm` for an unknown prefix.
    pub fn parse(value: &str) -> Result<Self> {
        let (algorithm, hex_part) =
            value
                .trim()
                .split_once(':')
                .ok_or_else(|| FulpackError::InvalidChecksum {
                    value: value.to_string(),
                    reason: "missing algorithm prefix",
                })?;
        let algorithm: Algorithm = algorithm.parse()?;

        if hex_part.len() != algorithm.digest_len() * 2 {
            return Err(FulpackError::InvalidChecksum {
                value: value.to_string(),
                reason: "hex length does not match algorithm",
            });
        }

        let bytes = hex::decode(hex_part.to_ascii_lowercase()).map_err(|_| {
            FulpackError::InvalidChecksum {
                value: value.to_string(),
                reason: "not a hex string",
            }
        })?;

        Ok(Self { algorithm, bytes })
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hex())
    }
}

impl FromStr for Digest {
    type Err = FulpackError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<Digest> for String {
    fn from(digest: Digest) -> Self {
        digest.formatted()
    }
}

impl TryFrom<String> for Digest {
    type Error = FulpackError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}
