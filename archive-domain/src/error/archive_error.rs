//! # Archive Error
//!
//! A single, flat error enum for the chunk codec, crypt/compress engines and
//! the archive writer/reader state machines. Every variant corresponds to a
//! failure kind named in the archive engine's error handling design: I/O,
//! format, crypt, entry and resource errors all live here so callers can
//! match on one type regardless of which layer raised it.

use thiserror::Error;

/// All failure modes surfaced by the archive core.
#[derive(Error, Debug)]
pub enum ArchiveError {
    // --- I/O ---
    #[error("end of archive")]
    EndOfArchive,

    #[error("I/O error: {0}")]
    Io(String),

    #[error("operation aborted")]
    Aborted,

    // --- Format ---
    #[error("corrupt data: {0}")]
    CorruptData(String),

    #[error("unknown chunk: {0}")]
    UnknownChunk(String),

    #[error("unsupported block size: {0}")]
    UnsupportedBlockSize(usize),

    #[error("invalid block length: {0}")]
    InvalidBlockLength(usize),

    // --- Crypt ---
    #[error("no password available to decrypt archive")]
    NoCryptPassword,

    #[error("invalid password")]
    InvalidPassword,

    #[error("no public key available")]
    NoPublicKey,

    #[error("no private key available")]
    NoPrivateKey,

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("wrong private key for this archive")]
    WrongPrivateKey,

    #[error("invalid key length: {0}")]
    InvalidKeyLength(usize),

    #[error("encrypt failed: {0}")]
    EncryptFail(String),

    #[error("decrypt failed: {0}")]
    DecryptFail(String),

    #[error("key creation failed: {0}")]
    CreateKeyFail(String),

    // --- Entry ---
    #[error("no file entry")]
    NoFileEntry,

    #[error("no file data")]
    NoFileData,

    #[error("no image entry")]
    NoImageEntry,

    #[error("no image data")]
    NoImageData,

    #[error("no directory entry")]
    NoDirectoryEntry,

    #[error("no link entry")]
    NoLinkEntry,

    #[error("no hardlink entry")]
    NoHardlinkEntry,

    #[error("no special entry")]
    NoSpecialEntry,

    #[error("compressor has no more data")]
    CompressEof,

    // --- Resource ---
    #[error("insufficient memory: {0}")]
    InsufficientMemory(String),
}

impl From<std::io::Error> for ArchiveError {
    fn from(err: std::io::Error) -> Self {
        ArchiveError::Io(err.to_string())
    }
}

impl ArchiveError {
    /// True for errors that should always win over a pending "try next
    /// password" decision while probing an encrypted entry.
    pub fn is_fatal_during_password_trial(&self) -> bool {
        matches!(self, ArchiveError::Io(_) | ArchiveError::Aborted)
    }
}
