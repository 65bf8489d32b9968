//! # Byte I/O capability set (C1)
//!
//! A small trait abstracting a raw file handle or a storage backend so the
//! chunk codec and archive layer never assume which one they are talking to.

use crate::error::ArchiveError;

/// Capability set consumed by the chunk codec and archive layer: `eof`,
/// `read`, `write`, `tell`, `seek`, `size`.
pub trait ByteIo: Send {
    /// True when the stream has no more bytes to read.
    fn eof(&mut self) -> Result<bool, ArchiveError>;

    /// Read up to `buf.len()` bytes, returning the number actually read.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ArchiveError>;

    /// Read exactly `buf.len()` bytes or fail with `CorruptData`.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), ArchiveError> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read(&mut buf[filled..])?;
            if n == 0 {
                return Err(ArchiveError::CorruptData("unexpected end of stream".into()));
            }
            filled += n;
        }
        Ok(())
    }

    /// Write all of `buf`.
    fn write(&mut self, buf: &[u8]) -> Result<(), ArchiveError>;

    /// Current stream offset.
    fn tell(&mut self) -> Result<u64, ArchiveError>;

    /// Seek to an absolute offset.
    fn seek(&mut self, offset: u64) -> Result<(), ArchiveError>;

    /// Total size of the stream, if known.
    fn size(&mut self) -> Result<u64, ArchiveError>;
}
