//! Domain layer for the chunked archive engine: error types, wire-stable
//! value objects, and the service contracts that `archive-core` implements.
//! No I/O and no concrete crypto/compression engines live here.

pub mod error;
pub mod services;
pub mod value_objects;

pub use error::ArchiveError;
pub use services::ByteIo;
pub use value_objects::{
    tags, ChunkTag, CipherAlgorithm, CompressionAlgorithm, CryptType, EntryMeta, FragmentRange,
    ImageBlockRange, PasswordMode, SpecialType,
};
