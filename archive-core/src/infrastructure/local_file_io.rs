//! [`ByteIo`] over a local file handle, the second of the two concrete
//! backends named in the byte I/O contract (the other being a remote
//! storage backend, represented in this crate by [`super::MemoryIo`] for
//! anything buffered in RAM before upload).

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use archive_domain::{ArchiveError, ByteIo};

pub struct LocalFileIo {
    file: File,
    len: u64,
}

impl LocalFileIo {
    pub fn create(path: &Path) -> Result<Self, ArchiveError> {
        let file = OpenOptions::new().read(true).write(true).create(true).truncate(true).open(path)?;
        Ok(Self { file, len: 0 })
    }

    pub fn open_read(path: &Path) -> Result<Self, ArchiveError> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(Self { file, len })
    }

    /// Wraps an already-open file handle, e.g. one obtained from a
    /// [`tempfile::NamedTempFile`] so the part is created without the
    /// delete-then-recreate race of going through a bare path.
    pub fn from_file(file: File) -> Result<Self, ArchiveError> {
        let len = file.metadata()?.len();
        Ok(Self { file, len })
    }
}

impl ByteIo for LocalFileIo {
    fn eof(&mut self) -> Result<bool, ArchiveError> {
        let pos = self.file.stream_position()?;
        Ok(pos >= self.len.max(self.file.metadata()?.len()))
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ArchiveError> {
        Ok(self.file.read(buf)?)
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), ArchiveError> {
        self.file.write_all(buf)?;
        let pos = self.file.stream_position()?;
        self.len = self.len.max(pos);
        Ok(())
    }

    fn tell(&mut self) -> Result<u64, ArchiveError> {
        Ok(self.file.stream_position()?)
    }

    fn seek(&mut self, offset: u64) -> Result<(), ArchiveError> {
        self.file.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    fn size(&mut self) -> Result<u64, ArchiveError> {
        Ok(self.file.metadata()?.len())
    }
}
