//! # Archive writer/reader (C6/C7)
//!
//! Ties the chunk codec, crypt and compress engines together into the
//! container/entry/meta/data nesting described in spec §4.6/§4.7: the
//! writer ([`writer::ArchiveWriter`]) drives compress -> encrypt -> chunk
//! for each entry kind, splitting parts as `maxPartSize` requires; the
//! reader ([`reader::ArchiveReader`]) walks the same nesting back out,
//! resolving per-entry passwords by CRC trial.

mod entry;
mod options;
mod reader;
mod writer;

pub use options::{ArchiveReaderConfig, ArchiveReaderSecrets, ArchiveWriterConfig, ArchiveWriterSecrets};
pub use reader::{ArchiveReader, EntryHeader, EntryKind, OpenPartFn};
pub use writer::{ArchiveWriter, FileEntryWriter, HardlinkEntryWriter, ImageEntryWriter, PartWritten};
