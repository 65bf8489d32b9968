//! # Chunk codec (C2)
//!
//! Binds a [`ChunkHeader`] to an I/O position and walks the fixed-field
//! area that follows it, optionally behind a [`CipherState`]. Higher layers
//! (the archive writer/reader) drive a `ChunkWriter`/`ChunkReader` pair per
//! nesting level; sub-chunk iteration (`next_sub`/`skip_sub`/`eof_sub`) is
//! bounded by the parent's `end_offset`, which is how an unknown chunk tag
//! gets silently skipped without understanding its contents.

use archive_domain::{ArchiveError, ByteIo, ChunkTag};

use crate::crypt::CipherState;

use super::header::{ChunkHeader, HEADER_SIZE};
use super::wire::aligned;

/// Opens a chunk for writing: writes a provisional header at the current
/// position and returns the header so the caller can patch it in `close`.
pub fn create(io: &mut dyn ByteIo, id: ChunkTag) -> Result<ChunkHeader, ArchiveError> {
    ChunkHeader::write_provisional(io, id)
}

/// Rewrites the header at `header.offset` with the final size and seeks
/// back to the end of the chunk's payload, which is wherever `io` currently
/// sits.
pub fn close(io: &mut dyn ByteIo, header: &ChunkHeader) -> Result<(), ArchiveError> {
    let end = io.tell()?;
    let size = end - header.offset - HEADER_SIZE;
    ChunkHeader::patch_size(io, header.offset, header.id, size)
}

/// Reads the next chunk header bounded by `parent_end` (the byte offset one
/// past the parent chunk's payload, or the stream size at the top level).
/// Returns `None` when the current position has reached that bound.
pub fn next_sub(io: &mut dyn ByteIo, parent_end: u64) -> Result<Option<ChunkHeader>, ArchiveError> {
    let pos = io.tell()?;
    if pos >= parent_end {
        return Ok(None);
    }
    ChunkHeader::read(io)
}

/// True when there are no more sub-chunks before `parent_end`.
pub fn eof_sub(io: &mut dyn ByteIo, parent_end: u64) -> Result<bool, ArchiveError> {
    Ok(io.tell()? >= parent_end)
}

/// Seeks past `header`'s payload without reading it.
pub fn skip_sub(io: &mut dyn ByteIo, header: &ChunkHeader) -> Result<(), ArchiveError> {
    io.seek(header.end_offset())
}

/// Writes a fixed-field area: `fields` is the already wire-encoded byte
/// buffer (callers build it with the `wire` helpers plus a trailing CRC32).
/// When `cipher` carries an algorithm, the buffer is zero-padded to a block
/// multiple and encrypted in place before being written; callers must size
/// their on-disk field count using [`super::wire::aligned`] ahead of time
/// to keep `fixedSize` accounting correct when `update` later rewrites it.
pub fn write_fixed_fields(
    io: &mut dyn ByteIo,
    cipher: &mut CipherState,
    fields: &[u8],
) -> Result<(), ArchiveError> {
    if cipher.is_none() {
        io.write(fields)?;
        return Ok(());
    }
    let block_len = cipher.block_length();
    let mut buf = fields.to_vec();
    buf.resize(aligned(buf.len(), block_len), 0);
    cipher.encrypt(&mut buf)?;
    io.write(&buf)
}

/// Reads `fixed_size` on-disk bytes (already block-aligned by the caller if
/// encrypted) and returns the decrypted plaintext fixed-field buffer.
pub fn read_fixed_fields(
    io: &mut dyn ByteIo,
    cipher: &mut CipherState,
    fixed_size: usize,
) -> Result<Vec<u8>, ArchiveError> {
    let on_disk = if cipher.is_none() { fixed_size } else { aligned(fixed_size, cipher.block_length()) };
    let mut buf = vec![0u8; on_disk];
    io.read_exact(&mut buf)?;
    if !cipher.is_none() {
        cipher.decrypt(&mut buf)?;
    }
    Ok(buf)
}

/// Rewrites the fixed-field area in place (used when a value only becomes
/// known after the payload has been written, e.g. `fragmentSize`).
/// `cipher` must be freshly reset to the same seed used at `create` time so
/// the ciphertext stays reproducible.
pub fn update_fixed_fields(
    io: &mut dyn ByteIo,
    header_offset: u64,
    cipher: &mut CipherState,
    fields: &[u8],
) -> Result<(), ArchiveError> {
    let saved = io.tell()?;
    io.seek(header_offset + HEADER_SIZE)?;
    write_fixed_fields(io, cipher, fields)?;
    io.seek(saved)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::MemoryIo;
    use archive_domain::tags;

    #[test]
    fn create_close_roundtrip_patches_size() {
        let mut io = MemoryIo::new();
        let header = create(&mut io, tags::FILE_ENTRY).unwrap();
        io.write(b"hello").unwrap();
        close(&mut io, &header).unwrap();

        io.seek(0).unwrap();
        let read_back = ChunkHeader::read(&mut io).unwrap().unwrap();
        assert_eq!(read_back.id, tags::FILE_ENTRY);
        assert_eq!(read_back.size, 5);
    }

    #[test]
    fn sub_chunk_iteration_respects_parent_end() {
        let mut io = MemoryIo::new();
        let h1 = create(&mut io, tags::FILE_META).unwrap();
        io.write(b"abc").unwrap();
        close(&mut io, &h1).unwrap();
        let h2 = create(&mut io, tags::FILE_DATA).unwrap();
        io.write(b"xy").unwrap();
        close(&mut io, &h2).unwrap();
        let parent_end = io.tell().unwrap();

        io.seek(0).unwrap();
        let first = next_sub(&mut io, parent_end).unwrap().unwrap();
        assert_eq!(first.id, tags::FILE_META);
        skip_sub(&mut io, &first).unwrap();
        assert!(!eof_sub(&mut io, parent_end).unwrap());
        let second = next_sub(&mut io, parent_end).unwrap().unwrap();
        assert_eq!(second.id, tags::FILE_DATA);
        skip_sub(&mut io, &second).unwrap();
        assert!(eof_sub(&mut io, parent_end).unwrap());
    }

    #[test]
    fn encrypted_fixed_fields_roundtrip() {
        use archive_domain::CipherAlgorithm;

        let key = [1u8; 32];
        let mut io = MemoryIo::new();
        let mut enc = CipherState::new_encryptor(CipherAlgorithm::Aes256, &key).unwrap();
        enc.reset(7);
        write_fixed_fields(&mut io, &mut enc, b"thirteen-bytes").unwrap();

        io.seek(0).unwrap();
        let mut dec = CipherState::new_decryptor(CipherAlgorithm::Aes256, &key).unwrap();
        dec.reset(7);
        let plain = read_fixed_fields(&mut io, &mut dec, b"thirteen-bytes".len()).unwrap();
        assert_eq!(&plain[..b"thirteen-bytes".len()], b"thirteen-bytes");
    }
}
