//! Wire encode/decode for the entry-meta and fragmentation value objects
//! shared across every entry kind (spec §6's fixed-field layouts).

use archive_domain::{ArchiveError, EntryMeta, FragmentRange, ImageBlockRange, SpecialType};

use crate::chunk::wire::{write_crc32, write_data, write_i64_le, write_string, write_u32_le, write_u64_le, FieldReader};

/// Encodes an [`EntryMeta`] as its fixed-field byte buffer, including the
/// trailing CRC32 over everything that precedes it.
pub fn encode_entry_meta(meta: &EntryMeta) -> Vec<u8> {
    let mut out = Vec::new();
    write_string(&mut out, &meta.name);
    write_u32_le(&mut out, meta.destination_name.is_some() as u32);
    if let Some(dest) = &meta.destination_name {
        write_string(&mut out, dest);
    }
    write_u32_le(&mut out, meta.size.is_some() as u32);
    if let Some(size) = meta.size {
        write_u64_le(&mut out, size);
    }
    write_i64_le(&mut out, meta.time_last_access as i64);
    write_i64_le(&mut out, meta.time_modified as i64);
    write_i64_le(&mut out, meta.time_last_changed as i64);
    write_u32_le(&mut out, meta.user_id);
    write_u32_le(&mut out, meta.group_id);
    write_u32_le(&mut out, meta.permission);
    write_u32_le(&mut out, meta.special_type.is_some() as u32);
    if let Some(special) = meta.special_type {
        write_u32_le(&mut out, special.wire_code());
        write_u32_le(&mut out, meta.major.unwrap_or(0));
        write_u32_le(&mut out, meta.minor.unwrap_or(0));
    }
    let __crc_snapshot = out.clone();
    write_crc32(&mut out, &__crc_snapshot);
    out
}

pub fn decode_entry_meta(buf: &[u8]) -> Result<EntryMeta, ArchiveError> {
    let mut r = FieldReader::new(buf);
    let name = r.read_string()?;
    let mut meta = EntryMeta::new(name);
    if r.read_u32_le()? != 0 {
        meta.destination_name = Some(r.read_string()?);
    }
    if r.read_u32_le()? != 0 {
        meta.size = Some(r.read_u64_le()?);
    }
    meta.time_last_access = r.read_i64_le()? as u64;
    meta.time_modified = r.read_i64_le()? as u64;
    meta.time_last_changed = r.read_i64_le()? as u64;
    meta.user_id = r.read_u32_le()?;
    meta.group_id = r.read_u32_le()?;
    meta.permission = r.read_u32_le()?;
    if r.read_u32_le()? != 0 {
        let special = SpecialType::from_wire_code(r.read_u32_le()?);
        meta.major = Some(r.read_u32_le()?);
        meta.minor = Some(r.read_u32_le()?);
        meta.special_type = Some(special);
    }
    r.read_and_verify_crc32()?;
    Ok(meta)
}

pub fn encode_fragment_range(range: FragmentRange) -> Vec<u8> {
    let mut out = Vec::new();
    write_u64_le(&mut out, range.fragment_offset);
    write_u64_le(&mut out, range.fragment_size);
    let __crc_snapshot = out.clone();
    write_crc32(&mut out, &__crc_snapshot);
    out
}

pub fn decode_fragment_range(buf: &[u8]) -> Result<FragmentRange, ArchiveError> {
    let mut r = FieldReader::new(buf);
    let fragment_offset = r.read_u64_le()?;
    let fragment_size = r.read_u64_le()?;
    r.read_and_verify_crc32()?;
    Ok(FragmentRange { fragment_offset, fragment_size })
}

pub fn encode_image_block_range(range: ImageBlockRange) -> Vec<u8> {
    let mut out = Vec::new();
    write_u64_le(&mut out, range.block_offset);
    write_u64_le(&mut out, range.block_count);
    write_u32_le(&mut out, range.block_size);
    let __crc_snapshot = out.clone();
    write_crc32(&mut out, &__crc_snapshot);
    out
}

pub fn decode_image_block_range(buf: &[u8]) -> Result<ImageBlockRange, ArchiveError> {
    let mut r = FieldReader::new(buf);
    let block_offset = r.read_u64_le()?;
    let block_count = r.read_u64_le()?;
    let block_size = r.read_u32_le()?;
    r.read_and_verify_crc32()?;
    Ok(ImageBlockRange { block_offset, block_count, block_size })
}

/// Encodes a hardlink `name` sub-chunk payload (one of several names
/// sharing the same data).
pub fn encode_hardlink_name(name: &str) -> Vec<u8> {
    let mut out = Vec::new();
    write_string(&mut out, name);
    let __crc_snapshot = out.clone();
    write_crc32(&mut out, &__crc_snapshot);
    out
}

pub fn decode_hardlink_name(buf: &[u8]) -> Result<String, ArchiveError> {
    let mut r = FieldReader::new(buf);
    let name = r.read_string()?;
    r.read_and_verify_crc32()?;
    Ok(name)
}

/// Top-level entry chunk fixed fields: never encrypted, carries the
/// algorithm identifiers the reader needs before it can derive any cipher
/// state.
pub fn encode_entry_header(compress_alg: u16, cipher_alg: u16) -> Vec<u8> {
    let mut out = Vec::new();
    write_u32_le(&mut out, compress_alg as u32);
    write_u32_le(&mut out, cipher_alg as u32);
    let __crc_snapshot = out.clone();
    write_crc32(&mut out, &__crc_snapshot);
    out
}

pub fn decode_entry_header(buf: &[u8]) -> Result<(u16, u16), ArchiveError> {
    let mut r = FieldReader::new(buf);
    let compress_alg = r.read_u32_le()? as u16;
    let cipher_alg = r.read_u32_le()? as u16;
    r.read_and_verify_crc32()?;
    Ok((compress_alg, cipher_alg))
}

/// Encodes a `data` sub-chunk's header bytes (used for data-header cipher
/// state separately from the payload cipher state, per spec's "one each
/// for entry-meta, data-header, data-payload").
pub fn encode_data_blob(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    write_data(&mut out, data);
    let __crc_snapshot = out.clone();
    write_crc32(&mut out, &__crc_snapshot);
    out
}

pub fn decode_data_blob(buf: &[u8]) -> Result<Vec<u8>, ArchiveError> {
    let mut r = FieldReader::new(buf);
    let data = r.read_data()?;
    r.read_and_verify_crc32()?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use archive_domain::EntryMeta;

    #[test]
    fn entry_meta_roundtrip() {
        let meta = EntryMeta::new("dir/file.txt")
            .with_size(4096)
            .with_times(1, 2, 3)
            .with_owner(1000, 1000, 0o644);
        let encoded = encode_entry_meta(&meta);
        let decoded = decode_entry_meta(&encoded).unwrap();
        assert_eq!(decoded, meta);
    }

    #[test]
    fn entry_meta_with_destination_and_special_roundtrip() {
        let meta = EntryMeta::new("dev/tty0")
            .with_destination("not-used-for-special")
            .with_special(SpecialType::CharacterDevice, 4, 0);
        let encoded = encode_entry_meta(&meta);
        let decoded = decode_entry_meta(&encoded).unwrap();
        assert_eq!(decoded, meta);
    }

    #[test]
    fn fragment_range_roundtrip() {
        let range = FragmentRange { fragment_offset: 1024, fragment_size: 65536 };
        let encoded = encode_fragment_range(range);
        assert_eq!(decode_fragment_range(&encoded).unwrap(), range);
    }

    #[test]
    fn corrupt_crc_is_detected() {
        let meta = EntryMeta::new("x");
        let mut encoded = encode_entry_meta(&meta);
        let last = encoded.len() - 1;
        encoded[last] ^= 0xff;
        assert!(decode_entry_meta(&encoded).is_err());
    }
}
