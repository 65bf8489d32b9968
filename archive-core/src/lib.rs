//! # Archive core
//!
//! Implements the chunk-based archive engine described by `archive-domain`:
//! the chunk codec (C2), crypt primitives (C3), compress primitives (C4),
//! the credential resolver (C5), the writer/reader (C6/C7), the bounded
//! message queue (C8) and the open-addressed change-detection dictionary
//! (C9), plus the two concrete [`archive_domain::ByteIo`] backends used by
//! the writer/reader and their tests.

pub mod archive;
pub mod chunk;
pub mod compress;
pub mod credentials;
pub mod crypt;
pub mod dict;
pub mod infrastructure;
pub mod queue;

pub use archive_domain::{
    tags, ArchiveError, ByteIo, ChunkTag, CipherAlgorithm, CompressionAlgorithm, CryptType, EntryMeta, FragmentRange,
    ImageBlockRange, PasswordMode, SpecialType,
};
