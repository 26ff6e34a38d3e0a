//! Output size accounting for archive writers.

use std::io;
use std::io::Write;

/// Writer at the bottom of an archive encoder stack that measures the
/// archive's on-disk size as it is produced.
///
/// Only bytes the inner writer accepts are counted. [`close`](Self::close)
/// flushes and reports the final size, which becomes
/// `ArchiveInfo::compressed_size`.
///
/// # Examples
///
/// ```
/// use fulpack_core::io::CountingWriter;
/// use std::io::Write;
///
/// let mut sink = CountingWriter::new(Vec::new());
/// sink.write_all(b"ustar")?;
/// write!(sink, "{:05}", 42)?;
/// assert_eq!(sink.close()?, 10);
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct CountingWriter<W: Write> {
    sink: W,
    written: u64,
}

impl<W: Write> CountingWriter<W> {
    /// Wraps `sink` with a zeroed counter.
    #[must_use]
    pub const fn new(sink: W) -> Self {
        Self { sink, written: 0 }
    }

    /// Bytes accepted so far, flushed or not.
    #[must_use]
    pub const fn total_bytes(&self) -> u64 {
        self.written
    }

    /// Flushes the sink and returns the final byte count.
    pub fn close(mut self) -> io::Result<u64> {
        self.sink.flush()?;
        Ok(self.written)
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let accepted = self.sink.write(buf)?;
        self.written += accepted as u64;
        Ok(accepted)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}
