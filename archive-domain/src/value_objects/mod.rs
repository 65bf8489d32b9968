//! Value objects shared by the chunk codec and the archive layer.

mod algorithms;
mod chunk_tag;
mod entry_meta;

pub use algorithms::{CipherAlgorithm, CompressionAlgorithm, CryptType, PasswordMode};
pub use chunk_tag::{tags, ChunkTag};
pub use entry_meta::{EntryMeta, FragmentRange, ImageBlockRange, SpecialType};
