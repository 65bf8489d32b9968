//! Concrete [`archive_domain::ByteIo`] backends: a local file and an
//! in-memory buffer.

mod local_file_io;
mod memory_io;

pub use local_file_io::LocalFileIo;
pub use memory_io::MemoryIo;
