//! Incremental hashing.

use std::io::Write;

use sha2::Digest as _;
use xxhash_rust::xxh3::Xxh3;

use super::Algorithm;
use super::Digest;

/// Streaming hasher for any supported [`Algorithm`].
///
/// Feed data with [`update`](Self::update) (or through `io::Write`) and
/// finish with [`digest`](Self::digest).
///
/// # Examples
///
/// ```
/// use fulpack_core::checksum::Algorithm;
/// use fulpack_core::checksum::StreamHasher;
///
/// let mut hasher = StreamHasher::new(Algorithm::Crc32);
/// hasher.update(b"1234");
/// hasher.update(b"56789");
/// assert_eq!(hasher.hexdigest(), "cbf43926");
/// ```
#[derive(Clone)]
pub struct StreamHasher {
    state: State,
}

#[derive(Clone)]
enum State {
    Xxh3(Box<Xxh3>),
    Sha256(sha2::Sha256),
    Crc32(crc32fast::Hasher),
}

impl StreamHasher {
    /// Creates a hasher for the given algorithm.
    #[must_use]
    pub fn new(algorithm: Algorithm) -> Self {
        let state = match algorithm {
            Algorithm::Xxh3_128 => State::Xxh3(Box::new(Xxh3::new())),
            Algorithm::Sha256 => State::Sha256(sha2::Sha256::new()),
            Algorithm::Crc32 => State::Crc32(crc32fast::Hasher::new()),
        };
        Self { state }
    }

    /// Returns the algorithm this hasher computes.
    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        match self.state {
            State::Xxh3(_) => Algorithm::Xxh3_128,
            State::Sha256(_) => Algorithm::Sha256,
            State::Crc32(_) => Algorithm::Crc32,
        }
    }

    /// Feeds more data into the hasher.
    pub fn update(&mut self, data: &[u8]) {
        match &mut self.state {
            State::Xxh3(h) => h.update(data),
            State::Sha256(h) => h.update(data),
            State::Crc32(h) => h.update(data),
        }
    }

    /// Finishes hashing and returns the digest.
    #[must_use]
    pub fn digest(self) -> Digest {
        let algorithm = self.algorithm();
        let bytes = match self.state {
            State::Xxh3(h) => h.digest128().to_be_bytes().to_vec(),
            State::Sha256(h) => h.finalize().to_vec(),
            State::Crc32(h) => h.finalize().to_be_bytes().to_vec(),
        };
        Digest::from_parts_unchecked(algorithm, bytes)
    }

    /// Finishes hashing and returns the lowercase hex digest.
    #[must_use]
    pub fn hexdigest(self) -> String {
        self.digest().hex()
    }
}

impl std::fmt::Debug for StreamHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHasher")
            .field("algorithm", &self.algorithm())
            .finish_non_exhaustive()
    }
}

impl Write for StreamHasher {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
