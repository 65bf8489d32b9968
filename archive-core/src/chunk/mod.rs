//! # Chunk codec (C2)
//!
//! The 12-byte [`header::ChunkHeader`], little-endian field encoding
//! ([`wire`]), and the [`codec`] functions that tie them to a [`ByteIo`]
//! stream for create/open/next/skip/close.

pub mod codec;
pub mod header;
pub mod wire;

pub use codec::{close, create, eof_sub, next_sub, read_fixed_fields, skip_sub, update_fixed_fields, write_fixed_fields};
pub use header::{ChunkHeader, HEADER_SIZE};
