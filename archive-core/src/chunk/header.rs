//! The 12-byte on-wire chunk header: `{id: [u8;4], size: u64_be}`.

use archive_domain::{ArchiveError, ByteIo, ChunkTag};

pub const HEADER_SIZE: u64 = 12;

/// A decoded chunk header plus the stream offset it was read from, so the
/// codec can rewind to patch the size later (`close`) or seek past an
/// unknown chunk using size alone.
#[derive(Debug, Clone, Copy)]
pub struct ChunkHeader {
    pub id: ChunkTag,
    pub size: u64,
    /// Offset of the first header byte.
    pub offset: u64,
}

impl ChunkHeader {
    /// Offset of the byte immediately following this chunk's payload.
    pub fn end_offset(&self) -> u64 {
        self.offset + HEADER_SIZE + self.size
    }

    pub fn encode(&self) -> [u8; 12] {
        let mut out = [0u8; 12];
        out[0..4].copy_from_slice(&self.id.as_bytes());
        out[4..12].copy_from_slice(&self.size.to_be_bytes());
        out
    }

    /// Reads a header at the current position of `io`, or `None` at eof.
    pub fn read(io: &mut dyn ByteIo) -> Result<Option<Self>, ArchiveError> {
        if io.eof()? {
            return Ok(None);
        }
        let offset = io.tell()?;
        let mut buf = [0u8; 12];
        io.read_exact(&mut buf)?;
        let id = ChunkTag::new([buf[0], buf[1], buf[2], buf[3]]);
        let size = u64::from_be_bytes(buf[4..12].try_into().unwrap());
        Ok(Some(ChunkHeader { id, size, offset }))
    }

    /// Writes a provisional header (size possibly 0, patched later by
    /// `close`) at the current position of `io`.
    pub fn write_provisional(io: &mut dyn ByteIo, id: ChunkTag) -> Result<Self, ArchiveError> {
        let offset = io.tell()?;
        let header = ChunkHeader { id, size: 0, offset };
        io.write(&header.encode())?;
        Ok(header)
    }

    /// Rewinds to `offset`, rewrites the header with the final `size`, and
    /// seeks back to the end of the chunk's payload.
    pub fn patch_size(io: &mut dyn ByteIo, offset: u64, id: ChunkTag, size: u64) -> Result<(), ArchiveError> {
        let end = offset + HEADER_SIZE + size;
        io.seek(offset)?;
        io.write(&ChunkHeader { id, size, offset }.encode())?;
        io.seek(end)?;
        Ok(())
    }
}
