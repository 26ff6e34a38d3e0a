//! Checksum service.
//!
//! Algorithm-agnostic digests in the canonical `algorithm:lowercase-hex`
//! form, computed either in one shot or incrementally.
//!
//! # Examples
//!
//! ```
//! use fulpack_core::checksum;
//! use fulpack_core::checksum::Algorithm;
//!
//! # fn main() -> Result<(), fulpack_core::FulpackError> {
//! let digest = checksum::hash(b"123456789", Algorithm::Crc32);
//! assert_eq!(digest.to_string(), "crc32:cbf43926");
//! assert!(checksum::verify(b"123456789", "crc32:CBF43926")?);
//! # Ok(())
//! # }
//! ```

mod algorithm;
mod digest;
mod hasher;

use std::fs::File;
use std::io::Read;
use std::path::Path;

pub use algorithm::Algorithm;
pub use digest::Digest;
pub use hasher::StreamHasher;

use crate::FulpackError;
use crate::Result;

const CHUNK_SIZE: usize = 64 * 1024;

/// Hashes a byte slice.
#[must_use]
pub fn hash(data: &[u8], algorithm: Algorithm) -> Digest {
    let mut hasher = StreamHasher::new(algorithm);
    hasher.update(data);
    hasher.digest()
}

/// Creates an incremental hasher.
#[must_use]
pub fn stream(algorithm: Algorithm) -> StreamHasher {
    StreamHasher::new(algorithm)
}

/// Hashes everything a reader yields, in fixed-size chunks.
pub fn hash_reader<R: Read>(mut reader: R, algorithm: Algorithm) -> std::io::Result<Digest> {
    let mut hasher = StreamHasher::new(algorithm);
    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(hasher.digest())
}

/// Hashes a file's content.
pub fn hash_file<P: AsRef<Path>>(path: P, algorithm: Algorithm) -> Result<Digest> {
    let file = File::open(path.as_ref())?;
    Ok(hash_reader(file, algorithm)?)
}

/// Verifies bytes against a formatted checksum string.
///
/// The algorithm is taken from the string's prefix; hex comparison is
/// case-insensitive.
///
/// # Errors
///
/// Returns an error only if `expected` is malformed or names an unsupported
/// algorithm. A mismatch is `Ok(false)`.
pub fn verify(data: &[u8], expected: &str) -> Result<bool> {
    let expected = Digest::parse(expected)?;
    Ok(hash(data, expected.algorithm()) == expected)
}

/// Verifies a file's content against a formatted checksum string.
pub fn verify_file<P: AsRef<Path>>(path: P, expected: &str) -> Result<bool> {
    let expected = Digest::parse(expected)?;
    let actual = hash_file(path, expected.algorithm())?;
    Ok(actual == expected)
}

/// Compares a recomputed digest with a recorded one.
pub(crate) fn ensure_match(path: &str, expected: &Digest, actual: &Digest) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(FulpackError::ChecksumMismatch {
            path: path.to_string(),
            expected: expected.formatted(),
            actual: actual.formatted(),
        })
    }
}
