//! Error types shared across the chunk, crypt, compress and archive layers.

mod archive_error;

pub use archive_error::ArchiveError;
