//! Reader wrapper that hashes data as it passes through.

use std::io::Read;

use crate::checksum::Algorithm;
use crate::checksum::Digest;
use crate::checksum::StreamHasher;

/// A reader that computes a digest of everything read through it.
///
/// Lets extraction and verification hash entry content in the same pass
/// that writes or discards it.
pub struct HashingReader<R> {
    inner: R,
    hasher: StreamHasher,
    bytes_read: u64,
}

impl<R: Read> HashingReader<R> {
    /// Wraps `inner`, hashing with `algorithm`.
    pub fn new(inner: R, algorithm: Algorithm) -> Self {
        Self {
            inner,
            hasher: StreamHasher::new(algorithm),
            bytes_read: 0,
        }
    }

    /// Total bytes read so far.
    #[must_use]
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Finishes hashing.
    #[must_use]
    pub fn finish(self) -> (Digest, u64) {
        (self.hasher.digest(), self.bytes_read)
    }
}

impl<R: Read> Read for HashingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.hasher.update(&buf[..n]);
            self.bytes_read += n as u64;
        }
        Ok(n)
    }
}
