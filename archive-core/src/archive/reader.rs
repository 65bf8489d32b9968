//! # Archive reader (C7)
//!
//! Mirrors the writer's container/entry/meta/data chunk nesting, resolving
//! the per-entry cipher key either from the archive-level `KEY` chunk
//! (asymmetric) or by trialing the credential resolver's candidate
//! passwords against the entry-meta chunk's CRC (symmetric, spec §4.7).
//!
//! A fragment's ciphertext is decrypted and decompressed eagerly when its
//! data chunk is opened, rather than streamed block-by-block: `CipherState`
//! only resolves its final 1-2 ciphertext-stealing blocks once the whole
//! fragment length is known, and fragments are already bounded by
//! `maxPartSize`, so buffering one fragment's plaintext is cheap. This is
//! an Open Question resolution recorded in `DESIGN.md`.

use std::path::{Path, PathBuf};

use archive_domain::{
    tags, ArchiveError, ByteIo, ChunkTag, CipherAlgorithm, CompressionAlgorithm, EntryMeta, FragmentRange,
    ImageBlockRange,
};
use secrecy::{ExposeSecret, SecretBox};

use crate::chunk::wire::aligned;
use crate::chunk::{self, ChunkHeader, HEADER_SIZE};
use crate::compress::Decompressor;
use crate::credentials::{CredentialResolver, PromptFn};
use crate::crypt::{self, unwrap_session_key, CipherState};
use crate::infrastructure::LocalFileIo;

use super::entry::{
    decode_entry_header, decode_entry_meta, decode_fragment_range, decode_hardlink_name, decode_image_block_range,
};
use super::options::{ArchiveReaderConfig, ArchiveReaderSecrets};

/// Plaintext length of the data sub-chunk's encrypted header: a
/// `fragmentOffset:u64, fragmentSize:u64` pair plus its trailing CRC32.
const FRAGMENT_HEADER_LEN: usize = 20;
/// As above, for images: `blockOffset:u64, blockCount:u64, blockSize:u32`
/// plus CRC32.
const IMAGE_HEADER_LEN: usize = 24;

/// Which kind of entry a container chunk decoded to, mirroring the six
/// top-level tags the writer produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Image,
    Directory,
    Link,
    Hardlink,
    Special,
}

impl EntryKind {
    fn from_container_tag(tag: ChunkTag) -> Option<Self> {
        Some(match tag {
            t if t == tags::FILE_ENTRY => EntryKind::File,
            t if t == tags::IMAGE_ENTRY => EntryKind::Image,
            t if t == tags::DIRECTORY_ENTRY => EntryKind::Directory,
            t if t == tags::LINK_ENTRY => EntryKind::Link,
            t if t == tags::HARDLINK_ENTRY => EntryKind::Hardlink,
            t if t == tags::SPECIAL_ENTRY => EntryKind::Special,
            _ => return None,
        })
    }

    fn meta_tag(self) -> ChunkTag {
        match self {
            EntryKind::File => tags::FILE_META,
            EntryKind::Image => tags::IMAGE_META,
            EntryKind::Directory => tags::DIRECTORY_META,
            EntryKind::Link => tags::LINK_META,
            EntryKind::Hardlink => tags::HARDLINK_META,
            EntryKind::Special => tags::SPECIAL_META,
        }
    }

    fn data_tag(self) -> Option<ChunkTag> {
        match self {
            EntryKind::File => Some(tags::FILE_DATA),
            EntryKind::Image => Some(tags::IMAGE_DATA),
            EntryKind::Hardlink => Some(tags::HARDLINK_DATA),
            EntryKind::Directory | EntryKind::Link | EntryKind::Special => None,
        }
    }

    fn has_names(self) -> bool {
        matches!(self, EntryKind::Hardlink)
    }
}

/// One decoded entry header: meta plus whatever fragmentation/alg
/// information the reader needs before it can pull data via [`ArchiveReader::read_data`].
pub struct EntryHeader {
    pub kind: EntryKind,
    pub meta: EntryMeta,
    pub extra_names: Vec<String>,
    pub compress_alg: CompressionAlgorithm,
    pub cipher_alg: CipherAlgorithm,
    pub fragment_range: Option<FragmentRange>,
    pub image_block_range: Option<ImageBlockRange>,
}

/// Supplies the path of part `part_number` (1-based) when the reader's
/// current part runs out, or `None` once there are no more parts.
pub type OpenPartFn<'a> = dyn FnMut(u32) -> Result<Option<PathBuf>, ArchiveError> + 'a;

pub struct ArchiveReader<'a> {
    config: ArchiveReaderConfig,
    secrets: ArchiveReaderSecrets,
    prompt_cb: Option<&'a mut PromptFn<'a>>,
    open_next_part: Box<OpenPartFn<'a>>,
    io: Option<LocalFileIo>,
    part_number: u32,
    session_key: Option<SecretBox<[u8]>>,
    open_data: Option<Decompressor>,
    pending_skip_to: Option<u64>,
}

impl<'a> ArchiveReader<'a> {
    pub fn open(
        config: ArchiveReaderConfig,
        secrets: ArchiveReaderSecrets,
        first_part_path: &Path,
        open_next_part: impl FnMut(u32) -> Result<Option<PathBuf>, ArchiveError> + 'a,
        prompt_cb: Option<&'a mut PromptFn<'a>>,
    ) -> Result<Self, ArchiveError> {
        let mut reader = Self {
            config,
            secrets,
            prompt_cb,
            open_next_part: Box::new(open_next_part),
            io: None,
            part_number: 0,
            session_key: None,
            open_data: None,
            pending_skip_to: None,
        };
        reader.open_part(first_part_path)?;
        Ok(reader)
    }

    fn open_part(&mut self, path: &Path) -> Result<(), ArchiveError> {
        let mut io = LocalFileIo::open_read(path)?;
        let end = io.size()?;
        let header = chunk::next_sub(&mut io, end)?.ok_or_else(|| ArchiveError::CorruptData("empty part".into()))?;
        if header.id != tags::HEADER {
            return Err(ArchiveError::CorruptData("missing BAR header".into()));
        }
        let mut buf = vec![0u8; header.size as usize];
        io.read_exact(&mut buf)?;
        self.part_number += 1;
        self.io = Some(io);

        if let Some(key_chunk) = self.peek_key_chunk(end)? {
            self.handle_key_chunk(&key_chunk)?;
        }
        Ok(())
    }

    fn peek_key_chunk(&mut self, parent_end: u64) -> Result<Option<ChunkHeader>, ArchiveError> {
        let io = self.io.as_mut().unwrap();
        let pos = io.tell()?;
        let Some(header) = chunk::next_sub(io, parent_end)? else { return Ok(None) };
        if header.id == tags::KEY {
            return Ok(Some(header));
        }
        io.seek(pos)?;
        Ok(None)
    }

    fn handle_key_chunk(&mut self, header: &ChunkHeader) -> Result<(), ArchiveError> {
        let io = self.io.as_mut().unwrap();
        let mut wrapped = vec![0u8; header.size as usize];
        io.read_exact(&mut wrapped)?;
        let private_key = self.secrets.private_key.as_ref().ok_or(ArchiveError::NoPrivateKey)?;
        let key_bytes = unwrap_session_key(private_key, &wrapped)?;
        self.session_key = Some(SecretBox::new(key_bytes.into_boxed_slice()));
        Ok(())
    }

    fn advance_part(&mut self) -> Result<bool, ArchiveError> {
        let Some(path) = (self.open_next_part)(self.part_number + 1)? else { return Ok(false) };
        self.open_part(&path)?;
        Ok(true)
    }

    fn current_part_end(&mut self) -> Result<u64, ArchiveError> {
        self.io.as_mut().unwrap().size()
    }

    /// Returns the next entry header, or `None` at the end of the archive.
    pub fn next_entry(&mut self) -> Result<Option<EntryHeader>, ArchiveError> {
        self.skip_current_entry()?;
        loop {
            if self.io.is_none() && !self.advance_part()? {
                return Ok(None);
            }
            let parent_end = self.current_part_end()?;
            let pos = self.io.as_mut().unwrap().tell()?;
            if pos >= parent_end {
                if !self.advance_part()? {
                    return Ok(None);
                }
                continue;
            }
            let Some(top) = chunk::next_sub(self.io.as_mut().unwrap(), parent_end)? else {
                if !self.advance_part()? {
                    return Ok(None);
                }
                continue;
            };
            if top.id == tags::KEY {
                self.handle_key_chunk(&top)?;
                continue;
            }
            let Some(kind) = EntryKind::from_container_tag(top.id) else {
                if self.config.skip_unknown {
                    tracing::debug!(tag = %top.id, offset = top.offset, size = top.size, "skipping unknown top-level chunk");
                    chunk::skip_sub(self.io.as_mut().unwrap(), &top)?;
                    continue;
                }
                return Err(ArchiveError::UnknownChunk(top.id.to_string()));
            };
            return self.open_entry(kind, &top).map(Some);
        }
    }

    #[tracing::instrument(level = "debug", skip(self, container), fields(kind = ?kind, offset = container.offset))]
    fn open_entry(&mut self, kind: EntryKind, container: &ChunkHeader) -> Result<EntryHeader, ArchiveError> {
        let container_end = container.end_offset();
        let entry_chunk = self.next_sub_checked(container_end, container.id)?;
        let mut buf = vec![0u8; entry_chunk.size as usize];
        self.io.as_mut().unwrap().read_exact(&mut buf)?;
        let (compress_code, cipher_code) = decode_entry_header(&buf)?;
        let compress_alg = CompressionAlgorithm::from_wire_code(compress_code)
            .ok_or_else(|| ArchiveError::CorruptData("unknown compression algorithm".into()))?;
        let cipher_alg = CipherAlgorithm::from_wire_code(cipher_code)
            .ok_or_else(|| ArchiveError::CorruptData("unknown cipher algorithm".into()))?;

        let meta_chunk = self.next_sub_checked(container_end, kind.meta_tag())?;
        let (meta, key_bytes) = self.resolve_meta(cipher_alg, &meta_chunk)?;

        let mut extra_names = Vec::new();
        if kind.has_names() {
            loop {
                let pos = self.io.as_mut().unwrap().tell()?;
                let Some(next) = chunk::next_sub(self.io.as_mut().unwrap(), container_end)? else { break };
                if next.id != tags::HARDLINK_NAME {
                    self.io.as_mut().unwrap().seek(pos)?;
                    break;
                }
                let mut cipher = CipherState::new_decryptor(cipher_alg, &key_bytes)?;
                cipher.reset(0);
                let plain = chunk::read_fixed_fields(self.io.as_mut().unwrap(), &mut cipher, next.size as usize)?;
                extra_names.push(decode_hardlink_name(&plain)?);
            }
        }

        let (fragment_range, image_block_range) = match kind.data_tag() {
            Some(data_tag) => self.open_data_chunk(kind, data_tag, container_end, cipher_alg, compress_alg, &key_bytes)?,
            None => (None, None),
        };

        self.pending_skip_to = Some(container_end);
        Ok(EntryHeader { kind, meta, extra_names, compress_alg, cipher_alg, fragment_range, image_block_range })
    }

    #[allow(clippy::too_many_arguments)]
    fn open_data_chunk(
        &mut self,
        kind: EntryKind,
        data_tag: ChunkTag,
        container_end: u64,
        cipher_alg: CipherAlgorithm,
        compress_alg: CompressionAlgorithm,
        key_bytes: &[u8],
    ) -> Result<(Option<FragmentRange>, Option<ImageBlockRange>), ArchiveError> {
        let data_chunk = self.next_sub_checked(container_end, data_tag)?;
        let header_len = if kind == EntryKind::Image { IMAGE_HEADER_LEN } else { FRAGMENT_HEADER_LEN };

        // The fragment/image range lives in its own encrypted header, ahead
        // of the compressed payload (spec: a data sub-chunk is "encrypted
        // header, encrypted+compressed payload"), so it needs its own
        // cipher state, independent of the payload's.
        let mut header_cipher = CipherState::new_decryptor(cipher_alg, key_bytes)?;
        header_cipher.reset(0);
        let header_on_disk_len =
            if header_cipher.is_none() { header_len } else { aligned(header_len, header_cipher.block_length()) };
        if data_chunk.size < header_on_disk_len as u64 {
            return Err(ArchiveError::CorruptData("data chunk shorter than its header".into()));
        }
        let header_buf = chunk::read_fixed_fields(self.io.as_mut().unwrap(), &mut header_cipher, header_len)?;
        let (fragment_range, image_block_range) = if kind == EntryKind::Image {
            (None, Some(decode_image_block_range(&header_buf)?))
        } else {
            (Some(decode_fragment_range(&header_buf)?), None)
        };

        let ciphertext_len = (data_chunk.size - header_on_disk_len as u64) as usize;
        let mut ciphertext = vec![0u8; ciphertext_len];
        self.io.as_mut().unwrap().read_exact(&mut ciphertext)?;
        let mut cipher = CipherState::new_decryptor(cipher_alg, key_bytes)?;
        cipher.reset(0);
        let mut plaintext = cipher.decrypt_stream(&ciphertext)?;
        plaintext.extend(cipher.finish()?);

        let mut decompressor = Decompressor::new(compress_alg)?;
        decompressor.put_block(&plaintext);
        self.open_data = Some(decompressor);

        Ok((fragment_range, image_block_range))
    }

    fn next_sub_checked(&mut self, parent_end: u64, expected: ChunkTag) -> Result<ChunkHeader, ArchiveError> {
        let pos = self.io.as_mut().unwrap().tell()?;
        let Some(header) = chunk::next_sub(self.io.as_mut().unwrap(), parent_end)? else {
            tracing::debug!(%expected, offset = pos, "chunk decode failed: container ended early");
            return Err(ArchiveError::CorruptData(format!("expected {expected} chunk, found end of container")));
        };
        if header.id != expected {
            tracing::debug!(%expected, found = %header.id, offset = header.offset, "chunk decode failed: unexpected tag");
            return Err(ArchiveError::CorruptData(format!("expected {expected} chunk, found {}", header.id)));
        }
        Ok(header)
    }

    fn resolve_meta(&mut self, cipher_alg: CipherAlgorithm, meta_chunk: &ChunkHeader) -> Result<(EntryMeta, Vec<u8>), ArchiveError> {
        if cipher_alg.is_none() {
            let plain = self.decode_meta_payload(meta_chunk, cipher_alg, &[])?;
            return Ok((plain, Vec::new()));
        }
        if let Some(session_key) = &self.session_key {
            let key = session_key.expose_secret().to_vec();
            let meta = self.decode_meta_payload(meta_chunk, cipher_alg, &key)?;
            return Ok((meta, key));
        }
        self.trial_symmetric_passwords(cipher_alg, meta_chunk)
    }

    fn decode_meta_payload(&mut self, meta_chunk: &ChunkHeader, cipher_alg: CipherAlgorithm, key: &[u8]) -> Result<EntryMeta, ArchiveError> {
        let io = self.io.as_mut().unwrap();
        io.seek(meta_chunk.offset + HEADER_SIZE)?;
        let mut cipher = CipherState::new_decryptor(cipher_alg, key)?;
        cipher.reset(0);
        let plain = chunk::read_fixed_fields(io, &mut cipher, meta_chunk.size as usize)?;
        decode_entry_meta(&plain)
    }

    fn trial_symmetric_passwords(&mut self, cipher_alg: CipherAlgorithm, meta_chunk: &ChunkHeader) -> Result<(EntryMeta, Vec<u8>), ArchiveError> {
        let global = clone_secret(&self.secrets.global_password);
        let job = clone_secret(&self.secrets.job_password);
        // Borrowed out of `self` for the resolver's lifetime so `self` stays
        // free for `decode_meta_payload`'s `&mut self` inside the loop.
        let mut prompt_cb = self.prompt_cb.take();
        let mut resolver =
            CredentialResolver::new(&self.config.archive_name, global, job, self.config.password_mode, prompt_cb.as_deref_mut());
        let result = loop {
            let Some(candidate) = resolver.next() else {
                tracing::debug!(archive = %self.config.archive_name, "password trial exhausted every candidate");
                break Err(ArchiveError::NoCryptPassword);
            };
            let derived = crypt::derive_key(cipher_alg, &candidate);
            let key_bytes = derived.expose_secret().to_vec();
            // A CRC32 fingerprint identifies which derived key was tried in
            // logs without exposing key material.
            let mut hasher = crc32fast::Hasher::new();
            hasher.update(&key_bytes);
            let fingerprint = hex::encode(hasher.finalize().to_be_bytes());
            match self.decode_meta_payload(meta_chunk, cipher_alg, &key_bytes) {
                Ok(meta) => {
                    tracing::debug!(fingerprint, "password trial succeeded");
                    CredentialResolver::accept(&candidate);
                    break Ok((meta, key_bytes));
                }
                Err(e) if e.is_fatal_during_password_trial() => break Err(e),
                Err(_) => {
                    tracing::debug!(fingerprint, "password trial failed, advancing to next candidate");
                    continue;
                }
            }
        };
        self.prompt_cb = prompt_cb;
        result
    }

    /// Pulls up to `out.len()` plaintext bytes from the entry's data chunk
    /// (a no-op returning `0` for entry kinds with no data chunk).
    pub fn read_data(&mut self, out: &mut [u8]) -> Result<usize, ArchiveError> {
        let Some(decompressor) = &mut self.open_data else { return Ok(0) };
        decompressor.inflate(out, out.len())
    }

    /// Seeks past whatever of the current entry's payload and footer the
    /// caller hasn't consumed, so `next_entry` can start cleanly.
    fn skip_current_entry(&mut self) -> Result<(), ArchiveError> {
        self.open_data = None;
        if let (Some(io), Some(end)) = (self.io.as_mut(), self.pending_skip_to.take()) {
            io.seek(end)?;
        }
        Ok(())
    }
}

/// [`SecretBox`] doesn't implement `Clone` (it would defeat the purpose of
/// zeroizing independently-owned copies); rebuild a fresh box with the same
/// bytes instead, since the credential resolver consumes its inputs by
/// value and a symmetric archive may need to offer the same password again
/// for the next entry.
fn clone_secret(secret: &Option<SecretBox<[u8]>>) -> Option<SecretBox<[u8]>> {
    secret.as_ref().map(|s| SecretBox::new(s.expose_secret().to_vec().into_boxed_slice()))
}
