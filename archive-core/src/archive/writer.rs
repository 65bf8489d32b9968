//! # Archive writer (C6)
//!
//! Drives the compress -> encrypt -> chunk pipeline described in the
//! archive engine's part-split policy: full cipher blocks are written
//! eagerly, the last partial block of an entry is finalized with
//! ciphertext stealing only when the entry actually closes, and a part is
//! rotated whenever the next full block would overflow `max_part_size`.

use std::path::PathBuf;

use archive_domain::{tags, ArchiveError, ByteIo, ChunkTag, CipherAlgorithm, CompressionAlgorithm, CryptType, EntryMeta, FragmentRange, ImageBlockRange};
use secrecy::SecretBox;

use crate::chunk::wire::{write_crc32, write_u16_le};
use crate::chunk::{self, ChunkHeader};
use crate::compress::{BlockGranularity, Compressor};
use crate::credentials::PromptFn;
use crate::crypt::{self, wrap_session_key, CipherState, RsaPublicKey};
use crate::infrastructure::LocalFileIo;

use super::entry::{
    encode_entry_header, encode_entry_meta, encode_fragment_range, encode_hardlink_name, encode_image_block_range,
};
use super::options::{ArchiveWriterConfig, ArchiveWriterSecrets};

/// A conservative estimate of the bytes an entry's top-level container,
/// entry chunk and meta chunk take up, used only to decide whether it is
/// worth rotating the part *before* opening an entry (so the header and
/// its first data block land in the same part).
const HEADER_LENGTH_ESTIMATE: u64 = 256;

/// Reported to `on_part_written` once a part file is finalized.
pub struct PartWritten {
    pub part_number: u32,
    pub last: bool,
    pub temp_path: PathBuf,
}

struct Part {
    io: LocalFileIo,
    temp_path: tempfile::TempPath,
}

pub struct ArchiveWriter<'a> {
    config: ArchiveWriterConfig,
    session_key: Option<SecretBox<[u8]>>,
    public_key: Option<RsaPublicKey>,
    part: Option<Part>,
    part_number: u32,
    on_part_written: Box<dyn FnMut(PartWritten) -> Result<(), ArchiveError> + 'a>,
    aborted: bool,
}

/// Per-entry pipeline state shared by file/image/hardlink entries: a
/// compressor and three independent cipher states (entry-meta,
/// data-header, data-payload), mirroring "one each" in the entry read
/// algorithm.
struct DataPipeline {
    compressor: Compressor,
    data_cipher: CipherState,
    block_length: usize,
    fragment_offset: u64,
    fragment_size: u64,
    header_written: bool,
}

impl DataPipeline {
    fn new(compress_alg: CompressionAlgorithm, cipher_alg: CipherAlgorithm, key: &[u8]) -> Result<Self, ArchiveError> {
        let block_length = cipher_alg.block_length();
        Ok(Self {
            compressor: Compressor::new(compress_alg, block_length)?,
            data_cipher: CipherState::new_encryptor(cipher_alg, key)?,
            block_length,
            fragment_offset: 0,
            fragment_size: 0,
            header_written: false,
        })
    }
}

pub struct FileEntryWriter {
    meta: EntryMeta,
    compress_alg: CompressionAlgorithm,
    pipeline: DataPipeline,
    headers: Option<OpenHeaders>,
}

pub struct ImageEntryWriter {
    device_name: String,
    meta: EntryMeta,
    compress_alg: CompressionAlgorithm,
    pipeline: DataPipeline,
    block_size: u32,
    headers: Option<OpenHeaders>,
}

pub struct HardlinkEntryWriter {
    names: Vec<String>,
    meta: EntryMeta,
    compress_alg: CompressionAlgorithm,
    pipeline: DataPipeline,
    headers: Option<OpenHeaders>,
}

struct OpenHeaders {
    container: ChunkHeader,
    data: ChunkHeader,
}

impl<'a> ArchiveWriter<'a> {
    pub fn create(
        config: ArchiveWriterConfig,
        secrets: ArchiveWriterSecrets,
        on_part_written: impl FnMut(PartWritten) -> Result<(), ArchiveError> + 'a,
        prompt_cb: Option<&mut PromptFn>,
    ) -> Result<Self, ArchiveError> {
        let session_key = match config.crypt_type {
            CryptType::None => None,
            CryptType::Symmetric => {
                let password = secrets
                    .password
                    .or_else(|| prompt_cb.and_then(|cb| cb(&config.archive_name)))
                    .ok_or(ArchiveError::NoCryptPassword)?;
                Some(crypt::derive_key(config.cipher_algorithm, &password))
            }
            CryptType::Asymmetric => {
                if secrets.public_key.is_none() {
                    return Err(ArchiveError::NoPublicKey);
                }
                let key_len = config.cipher_algorithm.key_length_bits() / 8;
                let mut key = vec![0u8; key_len];
                let mut os_rng = rand::rngs::OsRng;
                rand::TryRngCore::try_fill_bytes(&mut os_rng, &mut key).expect("OS RNG failure");
                Some(SecretBox::new(key.into_boxed_slice()))
            }
        };

        Ok(Self {
            public_key: secrets.public_key,
            config,
            session_key,
            part: None,
            part_number: 0,
            on_part_written: Box::new(on_part_written),
            aborted: false,
        })
    }

    pub fn abort(&mut self) {
        self.aborted = true;
    }

    fn check_aborted(&self) -> Result<(), ArchiveError> {
        if self.aborted {
            return Err(ArchiveError::Aborted);
        }
        Ok(())
    }

    fn session_key_bytes(&self) -> Vec<u8> {
        use secrecy::ExposeSecret;
        self.session_key.as_ref().map(|k| k.expose_secret().to_vec()).unwrap_or_default()
    }

    pub fn tell(&mut self) -> Result<u64, ArchiveError> {
        match &mut self.part {
            Some(part) => part.io.tell(),
            None => Ok(0),
        }
    }

    fn ensure_part_open(&mut self) -> Result<(), ArchiveError> {
        if self.part.is_some() {
            return Ok(());
        }
        self.open_new_part()
    }

    fn open_new_part(&mut self) -> Result<(), ArchiveError> {
        let named = tempfile::NamedTempFile::new()?;
        let (file, temp_path) = named.into_parts();
        let mut io = LocalFileIo::from_file(file)?;

        let header = chunk::create(&mut io, tags::HEADER)?;
        let mut fields = Vec::new();
        write_u16_le(&mut fields, 1);
        let fields_snapshot = fields.clone();
        write_crc32(&mut fields, &fields_snapshot);
        io.write(&fields)?;
        chunk::close(&mut io, &header)?;

        if matches!(self.config.crypt_type, CryptType::Asymmetric) {
            let public_key = self.public_key.as_ref().ok_or(ArchiveError::NoPublicKey)?;
            let wrapped = wrap_session_key(public_key, &self.session_key_bytes())?;
            let key_header = chunk::create(&mut io, tags::KEY)?;
            io.write(&wrapped)?;
            chunk::close(&mut io, &key_header)?;
        }

        self.part_number += 1;
        tracing::debug!(part_number = self.part_number, archive = %self.config.archive_name, "opened new part");
        self.part = Some(Part { io, temp_path });
        Ok(())
    }

    fn part_size(&mut self) -> Result<u64, ArchiveError> {
        match &mut self.part {
            Some(part) => part.io.tell(),
            None => Ok(0),
        }
    }

    fn close_part(&mut self, last: bool) -> Result<(), ArchiveError> {
        let Some(mut part) = self.part.take() else { return Ok(()) };
        let size = part.io.size()?;
        let temp_path = part.temp_path.keep().map_err(|e| ArchiveError::Io(e.to_string()))?;
        tracing::debug!(part_number = self.part_number, size, last, "closing part");
        (self.on_part_written)(PartWritten { part_number: self.part_number, last, temp_path })
    }

    /// Deletes the current part's temporary file without invoking the
    /// callback, used when `abort()` unwinds mid-write.
    fn discard_part(&mut self) {
        if let Some(part) = self.part.take() {
            let _ = std::fs::remove_file(&part.temp_path);
        }
    }

    fn open_entry_headers(
        &mut self,
        container_tag: ChunkTag,
        entry_tag: ChunkTag,
        meta_tag: ChunkTag,
        data_tag: ChunkTag,
        meta: &EntryMeta,
        compress_alg: CompressionAlgorithm,
        cipher_alg: CipherAlgorithm,
        pipeline: &mut DataPipeline,
        extra_names: &[String],
        name_tag: Option<ChunkTag>,
        is_image: bool,
    ) -> Result<OpenHeaders, ArchiveError> {
        self.ensure_part_open()?;
        let key_bytes = self.session_key_bytes();
        let io = &mut self.part.as_mut().unwrap().io;

        let container = chunk::create(io, container_tag)?;
        let entry_header = chunk::create(io, entry_tag)?;
        io.write(&encode_entry_header(compress_alg.wire_code(), cipher_alg.wire_code()))?;
        chunk::close(io, &entry_header)?;

        let mut meta_cipher = CipherState::new_encryptor(cipher_alg, &key_bytes)?;
        meta_cipher.reset(0);
        let meta_header = chunk::create(io, meta_tag)?;
        chunk::write_fixed_fields(io, &mut meta_cipher, &encode_entry_meta(meta))?;
        chunk::close(io, &meta_header)?;

        if let Some(tag) = name_tag {
            for extra in extra_names {
                let mut name_cipher = CipherState::new_encryptor(cipher_alg, &key_bytes)?;
                name_cipher.reset(0);
                let name_header = chunk::create(io, tag)?;
                chunk::write_fixed_fields(io, &mut name_cipher, &encode_hardlink_name(extra))?;
                chunk::close(io, &name_header)?;
            }
        }

        pipeline.data_cipher.reset(pipeline.fragment_offset);
        let data = chunk::create(io, data_tag)?;

        // The data-header (fragmentOffset/fragmentSize, or the image
        // blockOffset/blockCount/blockSize triple) is encrypted with its own
        // cipher state, independent of `data_cipher`'s payload stream (spec:
        // one cipher state each for entry-meta, data-header, data-payload).
        // Its true values aren't known until the fragment closes, so a
        // zeroed placeholder of the same on-disk size is written now and
        // patched in place by `finish_and_close_headers_with`.
        let mut header_cipher = CipherState::new_encryptor(cipher_alg, &key_bytes)?;
        header_cipher.reset(0);
        let placeholder = if is_image {
            encode_image_block_range(ImageBlockRange { block_offset: 0, block_count: 0, block_size: 0 })
        } else {
            encode_fragment_range(FragmentRange { fragment_offset: 0, fragment_size: 0 })
        };
        chunk::write_fixed_fields(io, &mut header_cipher, &placeholder)?;

        pipeline.header_written = true;
        Ok(OpenHeaders { container, data })
    }

    fn write_block(&mut self, pipeline: &mut DataPipeline) -> Result<(), ArchiveError> {
        let mut block = vec![0u8; pipeline.block_length];
        let n = pipeline.compressor.get_block(&mut block);
        debug_assert_eq!(n, pipeline.block_length);
        pipeline.data_cipher.encrypt(&mut block)?;
        self.part.as_mut().unwrap().io.write(&block)?;
        pipeline.fragment_size += pipeline.block_length as u64;
        Ok(())
    }

    /// Feeds `buf` through `pipeline`'s compressor, lazily opening entry
    /// headers and rotating parts as the part-split policy requires.
    #[allow(clippy::too_many_arguments)]
    fn drive_data(
        &mut self,
        pipeline: &mut DataPipeline,
        open: impl Fn(&mut Self, &mut DataPipeline) -> Result<OpenHeaders, ArchiveError>,
        headers: &mut Option<OpenHeaders>,
        buf: &[u8],
        image_block_size: Option<u32>,
        element_size: u64,
    ) -> Result<(), ArchiveError> {
        self.check_aborted()?;
        pipeline.compressor.deflate(buf)?;
        loop {
            self.check_aborted()?;
            if !pipeline.header_written {
                self.ensure_part_open()?;
                if self.config.max_part_size > 0 && self.part_size()? + HEADER_LENGTH_ESTIMATE >= self.config.max_part_size {
                    self.close_part(false)?;
                }
                *headers = Some(open(self, pipeline)?);
            }
            if pipeline.compressor.available_blocks(BlockGranularity::Full) == 0 {
                break;
            }
            if self.config.max_part_size > 0 {
                let will_exceed = self.part_size()? + pipeline.block_length as u64 >= self.config.max_part_size;
                // Only split on an `element_size` multiple (spec: no fragment
                // boundary inside a sub-`element_size` range), so a split
                // may be deferred a few blocks past `max_part_size`.
                let aligned = pipeline.fragment_size % element_size.max(1) == 0;
                if will_exceed && aligned {
                    self.split_fragment(pipeline, headers, image_block_size)?;
                    continue;
                }
            }
            self.write_block(pipeline)?;
        }
        Ok(())
    }

    fn split_fragment(&mut self, pipeline: &mut DataPipeline, headers: &mut Option<OpenHeaders>, image_block_size: Option<u32>) -> Result<(), ArchiveError> {
        while pipeline.compressor.available_blocks(BlockGranularity::Full) > 0 {
            self.write_block(pipeline)?;
        }
        pipeline.compressor.flush()?;
        while pipeline.compressor.available_blocks(BlockGranularity::Full) > 0 {
            self.write_block(pipeline)?;
        }
        let remainder_len = pipeline.compressor.available_bytes();
        if remainder_len > 0 {
            let mut remainder = vec![0u8; remainder_len];
            pipeline.compressor.get_block(&mut remainder);
            let mut ciphertext = pipeline.data_cipher.encrypt_stream(&remainder)?;
            ciphertext.extend(pipeline.data_cipher.finish()?);
            pipeline.fragment_size += remainder.len() as u64;
            self.part.as_mut().unwrap().io.write(&ciphertext)?;
        }
        match image_block_size {
            Some(block_size) => self.finish_and_close_headers_image(pipeline, block_size, headers)?,
            None => self.finish_and_close_headers(pipeline, headers)?,
        }
        self.close_part(false)?;

        pipeline.compressor.reset()?;
        pipeline.fragment_offset += pipeline.fragment_size;
        pipeline.fragment_size = 0;
        pipeline.header_written = false;
        Ok(())
    }

    fn finish_and_close_headers(&mut self, pipeline: &DataPipeline, headers: &mut Option<OpenHeaders>) -> Result<(), ArchiveError> {
        let range = FragmentRange { fragment_offset: pipeline.fragment_offset, fragment_size: pipeline.fragment_size };
        self.finish_and_close_headers_with(headers, &encode_fragment_range(range))
    }

    /// As `finish_and_close_headers`, but for image entries whose data-meta
    /// is a `blockOffset/blockCount/blockSize` triple rather than a
    /// `fragmentOffset/fragmentSize` pair.
    fn finish_and_close_headers_image(&mut self, pipeline: &DataPipeline, block_size: u32, headers: &mut Option<OpenHeaders>) -> Result<(), ArchiveError> {
        let len = (block_size as u64).max(1);
        let range = ImageBlockRange {
            block_offset: pipeline.fragment_offset / len,
            block_count: pipeline.fragment_size / len,
            block_size,
        };
        self.finish_and_close_headers_with(headers, &encode_image_block_range(range))
    }

    fn finish_and_close_headers_with(&mut self, headers: &mut Option<OpenHeaders>, range_bytes: &[u8]) -> Result<(), ArchiveError> {
        let Some(open) = headers.take() else { return Ok(()) };
        let cipher_alg = self.config.cipher_algorithm;
        let key_bytes = self.session_key_bytes();
        let io = &mut self.part.as_mut().unwrap().io;
        let mut header_cipher = CipherState::new_encryptor(cipher_alg, &key_bytes)?;
        header_cipher.reset(0);
        chunk::update_fixed_fields(io, open.data.offset, &mut header_cipher, range_bytes)?;
        chunk::close(io, &open.data)?;
        chunk::close(io, &open.container)?;
        Ok(())
    }

    // --- File entries ---

    #[tracing::instrument(level = "debug", skip(self, meta, compress))]
    pub fn new_file_entry(&mut self, name: &str, meta: EntryMeta, compress: Option<CompressionAlgorithm>) -> Result<FileEntryWriter, ArchiveError> {
        let compress_alg = compress.unwrap_or(self.config.compress_algorithm);
        let pipeline = DataPipeline::new(compress_alg, self.config.cipher_algorithm, &self.session_key_bytes())?;
        Ok(FileEntryWriter { meta, compress_alg, pipeline, headers: None })
    }

    pub fn write_file_data(&mut self, entry: &mut FileEntryWriter, buf: &[u8], element_size: u64) -> Result<(), ArchiveError> {
        let meta = entry.meta.clone();
        let compress_alg = entry.compress_alg;
        let cipher_alg = self.config.cipher_algorithm;
        self.drive_data(
            &mut entry.pipeline,
            |writer, pipeline| {
                writer.open_entry_headers(
                    tags::FILE_ENTRY,
                    tags::FILE_ENTRY,
                    tags::FILE_META,
                    tags::FILE_DATA,
                    &meta.clone().with_size(meta.size.unwrap_or(0)),
                    compress_alg,
                    cipher_alg,
                    pipeline,
                    &[],
                    None,
                    false,
                )
            },
            &mut entry.headers,
            buf,
            None,
            element_size,
        )
    }

    #[tracing::instrument(level = "debug", skip_all, fields(fragment_size = entry.pipeline.fragment_size))]
    pub fn close_file_entry(&mut self, entry: &mut FileEntryWriter) -> Result<(), ArchiveError> {
        if !entry.pipeline.header_written && entry.headers.is_none() {
            let meta = entry.meta.clone();
            let compress_alg = entry.compress_alg;
            let cipher_alg = self.config.cipher_algorithm;
            entry.headers = Some(self.open_entry_headers(
                tags::FILE_ENTRY,
                tags::FILE_ENTRY,
                tags::FILE_META,
                tags::FILE_DATA,
                &meta,
                compress_alg,
                cipher_alg,
                &mut entry.pipeline,
                &[],
                None,
                false,
            )?);
        }
        self.finalize_pipeline(&mut entry.pipeline, &mut entry.headers)
    }

    fn finalize_pipeline(&mut self, pipeline: &mut DataPipeline, headers: &mut Option<OpenHeaders>) -> Result<(), ArchiveError> {
        self.flush_pipeline_data(pipeline)?;
        self.finish_and_close_headers(pipeline, headers)
    }

    /// Flushes the compressor and writes every remaining byte (full blocks
    /// plainly, the final partial block via ciphertext stealing). Leaves
    /// header closing to the caller, since file/hardlink and image entries
    /// encode different data-meta shapes.
    fn flush_pipeline_data(&mut self, pipeline: &mut DataPipeline) -> Result<(), ArchiveError> {
        pipeline.compressor.flush()?;
        while pipeline.compressor.available_blocks(BlockGranularity::Full) > 0 {
            self.write_block(pipeline)?;
        }
        let remainder_len = pipeline.compressor.available_bytes();
        if remainder_len > 0 {
            let mut remainder = vec![0u8; remainder_len];
            pipeline.compressor.get_block(&mut remainder);
            let mut ciphertext = pipeline.data_cipher.encrypt_stream(&remainder)?;
            ciphertext.extend(pipeline.data_cipher.finish()?);
            pipeline.fragment_size += remainder.len() as u64;
            self.part.as_mut().unwrap().io.write(&ciphertext)?;
        }
        Ok(())
    }

    // --- Hardlink entries ---

    #[tracing::instrument(level = "debug", skip(self, meta, compress), fields(name_count = names.len()))]
    pub fn new_hardlink_entry(&mut self, names: Vec<String>, meta: EntryMeta, compress: Option<CompressionAlgorithm>) -> Result<HardlinkEntryWriter, ArchiveError> {
        let compress_alg = compress.unwrap_or(self.config.compress_algorithm);
        let pipeline = DataPipeline::new(compress_alg, self.config.cipher_algorithm, &self.session_key_bytes())?;
        Ok(HardlinkEntryWriter { names, meta, compress_alg, pipeline, headers: None })
    }

    pub fn write_hardlink_data(&mut self, entry: &mut HardlinkEntryWriter, buf: &[u8], element_size: u64) -> Result<(), ArchiveError> {
        let meta = entry.meta.clone();
        let compress_alg = entry.compress_alg;
        let cipher_alg = self.config.cipher_algorithm;
        let names = entry.names.clone();
        self.drive_data(
            &mut entry.pipeline,
            |writer, pipeline| {
                writer.open_entry_headers(
                    tags::HARDLINK_ENTRY,
                    tags::HARDLINK_ENTRY,
                    tags::HARDLINK_META,
                    tags::HARDLINK_DATA,
                    &meta.clone(),
                    compress_alg,
                    cipher_alg,
                    pipeline,
                    &names[1..],
                    Some(tags::HARDLINK_NAME),
                    false,
                )
            },
            &mut entry.headers,
            buf,
            None,
            element_size,
        )
    }

    #[tracing::instrument(level = "debug", skip_all, fields(fragment_size = entry.pipeline.fragment_size))]
    pub fn close_hardlink_entry(&mut self, entry: &mut HardlinkEntryWriter) -> Result<(), ArchiveError> {
        if entry.headers.is_none() {
            let meta = entry.meta.clone();
            let compress_alg = entry.compress_alg;
            let cipher_alg = self.config.cipher_algorithm;
            let names = entry.names.clone();
            entry.headers = Some(self.open_entry_headers(
                tags::HARDLINK_ENTRY,
                tags::HARDLINK_ENTRY,
                tags::HARDLINK_META,
                tags::HARDLINK_DATA,
                &meta,
                compress_alg,
                cipher_alg,
                &mut entry.pipeline,
                &names[1..],
                Some(tags::HARDLINK_NAME),
                false,
            )?);
        }
        self.finalize_pipeline(&mut entry.pipeline, &mut entry.headers)
    }

    // --- Image entries ---

    #[tracing::instrument(level = "debug", skip(self, meta, compress))]
    pub fn new_image_entry(&mut self, device_name: &str, meta: EntryMeta, block_size: u32, compress: Option<CompressionAlgorithm>) -> Result<ImageEntryWriter, ArchiveError> {
        let compress_alg = compress.unwrap_or(self.config.compress_algorithm);
        let pipeline = DataPipeline::new(compress_alg, self.config.cipher_algorithm, &self.session_key_bytes())?;
        Ok(ImageEntryWriter { device_name: device_name.to_string(), meta, compress_alg, pipeline, block_size, headers: None })
    }

    pub fn write_image_data(&mut self, entry: &mut ImageEntryWriter, buf: &[u8]) -> Result<(), ArchiveError> {
        let meta = entry.meta.clone();
        let compress_alg = entry.compress_alg;
        let cipher_alg = self.config.cipher_algorithm;
        self.drive_data(
            &mut entry.pipeline,
            |writer, pipeline| {
                writer.open_entry_headers(
                    tags::IMAGE_ENTRY,
                    tags::IMAGE_ENTRY,
                    tags::IMAGE_META,
                    tags::IMAGE_DATA,
                    &meta.clone(),
                    compress_alg,
                    cipher_alg,
                    pipeline,
                    &[],
                    None,
                    true,
                )
            },
            &mut entry.headers,
            buf,
            Some(entry.block_size),
            entry.block_size as u64,
        )
    }

    #[tracing::instrument(level = "debug", skip_all, fields(fragment_size = entry.pipeline.fragment_size))]
    pub fn close_image_entry(&mut self, entry: &mut ImageEntryWriter) -> Result<(), ArchiveError> {
        if entry.headers.is_none() {
            let meta = entry.meta.clone();
            let compress_alg = entry.compress_alg;
            let cipher_alg = self.config.cipher_algorithm;
            entry.headers = Some(self.open_entry_headers(
                tags::IMAGE_ENTRY,
                tags::IMAGE_ENTRY,
                tags::IMAGE_META,
                tags::IMAGE_DATA,
                &meta,
                compress_alg,
                cipher_alg,
                &mut entry.pipeline,
                &[],
                None,
                true,
            )?);
        }
        self.flush_pipeline_data(&mut entry.pipeline)?;
        self.finish_and_close_headers_image(&entry.pipeline, entry.block_size, &mut entry.headers)
    }

    // --- Directory / Link / Special: no data chunk, single meta write ---

    pub fn write_directory_entry(&mut self, name: &str, meta: EntryMeta) -> Result<(), ArchiveError> {
        self.write_simple_entry(tags::DIRECTORY_ENTRY, tags::DIRECTORY_META, name, meta)
    }

    pub fn write_link_entry(&mut self, name: &str, target_name: &str, meta: EntryMeta) -> Result<(), ArchiveError> {
        let meta = meta.with_destination(target_name);
        self.write_simple_entry(tags::LINK_ENTRY, tags::LINK_META, name, meta)
    }

    pub fn write_special_entry(&mut self, name: &str, meta: EntryMeta) -> Result<(), ArchiveError> {
        self.write_simple_entry(tags::SPECIAL_ENTRY, tags::SPECIAL_META, name, meta)
    }

    fn write_simple_entry(&mut self, entry_tag: ChunkTag, meta_tag: ChunkTag, _name: &str, meta: EntryMeta) -> Result<(), ArchiveError> {
        self.check_aborted()?;
        self.ensure_part_open()?;
        let cipher_alg = self.config.cipher_algorithm;
        let compress_alg = CompressionAlgorithm::None;
        let key_bytes = self.session_key_bytes();
        let io = &mut self.part.as_mut().unwrap().io;

        let container = chunk::create(io, entry_tag)?;
        let header = chunk::create(io, entry_tag)?;
        io.write(&encode_entry_header(compress_alg.wire_code(), cipher_alg.wire_code()))?;
        chunk::close(io, &header)?;

        let mut meta_cipher = CipherState::new_encryptor(cipher_alg, &key_bytes)?;
        meta_cipher.reset(0);
        let meta_header = chunk::create(io, meta_tag)?;
        chunk::write_fixed_fields(io, &mut meta_cipher, &encode_entry_meta(&meta))?;
        chunk::close(io, &meta_header)?;

        chunk::close(io, &container)
    }

    /// Finalizes the archive: closes any open part (marking it `last`) and
    /// consumes the writer.
    pub fn close(mut self) -> Result<(), ArchiveError> {
        if self.part.is_some() {
            self.close_part(true)?;
        }
        Ok(())
    }
}

impl Drop for ArchiveWriter<'_> {
    fn drop(&mut self) {
        if self.aborted {
            self.discard_part();
        }
    }
}

