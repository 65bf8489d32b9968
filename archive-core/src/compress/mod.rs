//! # Compress primitives (C4)
//!
//! Block-granular streaming deflate/zstd over [`flate2::Compress`] and
//! [`zstd::stream::raw`]'s `Operation` trait. Both engines speak the same
//! "push bytes in, drain whole blocks out" shape, so [`Compressor`] and
//! [`Decompressor`] dispatch across them without the writer/reader caring
//! which algorithm is active.

mod compressor;
mod decompressor;

pub use compressor::Compressor;
pub use decompressor::Decompressor;

/// Selects whether [`Compressor::available_blocks`] counts only
/// fully-formed blocks or any buffered bytes at all, mirroring the writer's
/// two use sites: draining whole blocks during normal writes, versus
/// draining everything at `flush`/entry close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockGranularity {
    Full,
    Any,
}
