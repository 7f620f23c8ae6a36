//! Read/write streams backed by a [`RamFile`].

use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Arc;

use crate::core::InputStream;
use crate::ram::RamFile;

/// Seekable reader over a file's bytes.
///
/// The length is captured when the stream is opened, so bytes appended
/// afterwards never show through it: an in-flight append is observed
/// completely or not at all.
pub struct RamInput {
    file: Arc<RamFile>,
    len: u64,
    pos: u64,
}

impl RamInput {
    pub(crate) fn new(file: Arc<RamFile>) -> Self {
        let len = file.len();
        Self { file, len, pos: 0 }
    }
}

impl Read for RamInput {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.len {
            return Ok(0);
        }
        let want = out.len().min((self.len - self.pos) as usize);
        let n = self.file.read_at(self.pos, &mut out[..want]);
        self.pos += n as u64;
        Ok(n)
    }
}

impl Seek for RamInput {
    /// Seeking past the end is allowed; subsequent reads return 0 bytes.
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(n) => n as i128,
            SeekFrom::End(n) => self.len as i128 + n as i128,
            SeekFrom::Current(n) => self.pos as i128 + n as i128,
        };
        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of stream",
            ));
        }
        self.pos = target as u64;
        Ok(self.pos)
    }
}

impl InputStream for RamInput {
    fn len(&self) -> u64 {
        self.len
    }
}

/// Append-only writer over a file. Writes are infallible; `flush` is a
/// no-op since bytes land in their final place immediately.
pub struct RamOutput {
    file: Arc<RamFile>,
}

impl RamOutput {
    pub(crate) fn new(file: Arc<RamFile>) -> Self {
        Self { file }
    }
}

impl Write for RamOutput {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.file.append(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
