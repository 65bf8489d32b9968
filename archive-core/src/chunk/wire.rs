//! Byte-order framing primitives. Every field encoding in the chunk codec
//! goes through here — never open-code a shift outside this module (spec
//! §9, "Manual byte-order framing").
//!
//! The chunk header is big-endian (`size:u64_be`); the archive schema's
//! fixed-field area is little-endian. Strings are `{u16 length, bytes}`,
//! arrays are `{u16 count, elements}`, both length-prefixed in little-endian.

use archive_domain::ArchiveError;

pub fn write_u8(out: &mut Vec<u8>, v: u8) {
    out.push(v);
}

pub fn write_u16_le(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

pub fn write_u32_le(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

pub fn write_u64_le(out: &mut Vec<u8>, v: u64) {
    out.extend_from_slice(&v.to_le_bytes());
}

pub fn write_u64_be(out: &mut Vec<u8>, v: u64) {
    out.extend_from_slice(&v.to_be_bytes());
}

pub fn write_i64_le(out: &mut Vec<u8>, v: i64) {
    out.extend_from_slice(&v.to_le_bytes());
}

pub fn write_string(out: &mut Vec<u8>, s: &str) {
    let bytes = s.as_bytes();
    write_u16_le(out, bytes.len() as u16);
    out.extend_from_slice(bytes);
}

pub fn write_data(out: &mut Vec<u8>, data: &[u8]) {
    write_u32_le(out, data.len() as u32);
    out.extend_from_slice(data);
}

pub fn write_crc32(out: &mut Vec<u8>, preceding: &[u8]) {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(preceding);
    write_u32_le(out, hasher.finalize());
}

/// A small read cursor over an in-memory field buffer, used by both the
/// encrypted and plaintext fixed-field decoders.
pub struct FieldReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ArchiveError> {
        if self.pos + n > self.buf.len() {
            return Err(ArchiveError::CorruptData("truncated field".into()));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, ArchiveError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16_le(&mut self) -> Result<u16, ArchiveError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32_le(&mut self) -> Result<u32, ArchiveError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u64_le(&mut self) -> Result<u64, ArchiveError> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes(b.try_into().unwrap()))
    }

    pub fn read_i64_le(&mut self) -> Result<i64, ArchiveError> {
        let b = self.take(8)?;
        Ok(i64::from_le_bytes(b.try_into().unwrap()))
    }

    pub fn read_string(&mut self) -> Result<String, ArchiveError> {
        let len = self.read_u16_le()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|e| ArchiveError::CorruptData(format!("invalid utf-8 string: {e}")))
    }

    pub fn read_data(&mut self) -> Result<Vec<u8>, ArchiveError> {
        let len = self.read_u32_le()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    /// Reads a CRC32 field and verifies it against everything read so far
    /// in this reader (i.e. all preceding fields of the current chunk).
    pub fn read_and_verify_crc32(&mut self) -> Result<(), ArchiveError> {
        let covered = &self.buf[..self.pos];
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(covered);
        let expected = hasher.finalize();
        let actual = self.read_u32_le()?;
        if actual != expected {
            return Err(ArchiveError::CorruptData(format!(
                "CRC32 mismatch: expected {expected:#x}, got {actual:#x}"
            )));
        }
        Ok(())
    }

    pub fn remaining(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }
}

/// Round `len` up to the next multiple of `block_length` (alignment for
/// encrypted fixed-field areas). `block_length` of 0 or 1 is a no-op.
pub fn aligned(len: usize, block_length: usize) -> usize {
    if block_length <= 1 {
        return len;
    }
    len.div_ceil(block_length) * block_length
}
