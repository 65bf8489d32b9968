//! In-memory [`ByteIo`] backend, used by the codec/archive test suites and
//! by callers who want to build a small archive entirely in RAM before
//! flushing it to a [`LocalFileIo`](super::LocalFileIo).

use archive_domain::{ArchiveError, ByteIo};

#[derive(Debug, Default)]
pub struct MemoryIo {
    buf: Vec<u8>,
    pos: usize,
}

impl MemoryIo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(buf: Vec<u8>) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }
}

impl ByteIo for MemoryIo {
    fn eof(&mut self) -> Result<bool, ArchiveError> {
        Ok(self.pos >= self.buf.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ArchiveError> {
        let n = buf.len().min(self.buf.len() - self.pos);
        buf[..n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), ArchiveError> {
        let end = self.pos + buf.len();
        if end > self.buf.len() {
            self.buf.resize(end, 0);
        }
        self.buf[self.pos..end].copy_from_slice(buf);
        self.pos = end;
        Ok(())
    }

    fn tell(&mut self) -> Result<u64, ArchiveError> {
        Ok(self.pos as u64)
    }

    fn seek(&mut self, offset: u64) -> Result<(), ArchiveError> {
        self.pos = offset as usize;
        Ok(())
    }

    fn size(&mut self) -> Result<u64, ArchiveError> {
        Ok(self.buf.len() as u64)
    }
}
