//! Wire-stable algorithm identifiers.
//!
//! Compression and cipher algorithms are stored as `u16` codes in an entry's
//! top-level chunk (spec: "Algorithm identifiers on the wire"). The codes
//! below are the stable mapping; never renumber an existing variant.

use serde::{Deserialize, Serialize};

/// Compression algorithms recognized by the writer's `compressAlgorithm`
/// configuration and stored on the wire as a `u16` code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompressionAlgorithm {
    None,
    Deflate,
    DeflateBest,
    Zstd,
}

impl CompressionAlgorithm {
    pub const fn wire_code(self) -> u16 {
        match self {
            CompressionAlgorithm::None => 0,
            CompressionAlgorithm::Deflate => 1,
            CompressionAlgorithm::DeflateBest => 2,
            CompressionAlgorithm::Zstd => 3,
        }
    }

    pub const fn from_wire_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(CompressionAlgorithm::None),
            1 => Some(CompressionAlgorithm::Deflate),
            2 => Some(CompressionAlgorithm::DeflateBest),
            3 => Some(CompressionAlgorithm::Zstd),
            _ => None,
        }
    }

    pub const fn is_none(self) -> bool {
        matches!(self, CompressionAlgorithm::None)
    }
}

/// Symmetric cipher algorithms, one of `{none, 3DES, CAST5, Blowfish,
/// AES128/192/256, Twofish128/256}` per spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CipherAlgorithm {
    None,
    TripleDes,
    Cast5,
    Blowfish,
    Aes128,
    Aes192,
    Aes256,
    Twofish128,
    Twofish256,
}

impl CipherAlgorithm {
    pub const fn wire_code(self) -> u16 {
        match self {
            CipherAlgorithm::None => 0,
            CipherAlgorithm::TripleDes => 1,
            CipherAlgorithm::Cast5 => 2,
            CipherAlgorithm::Blowfish => 3,
            CipherAlgorithm::Aes128 => 4,
            CipherAlgorithm::Aes192 => 5,
            CipherAlgorithm::Aes256 => 6,
            CipherAlgorithm::Twofish128 => 7,
            CipherAlgorithm::Twofish256 => 8,
        }
    }

    pub const fn from_wire_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(CipherAlgorithm::None),
            1 => Some(CipherAlgorithm::TripleDes),
            2 => Some(CipherAlgorithm::Cast5),
            3 => Some(CipherAlgorithm::Blowfish),
            4 => Some(CipherAlgorithm::Aes128),
            5 => Some(CipherAlgorithm::Aes192),
            6 => Some(CipherAlgorithm::Aes256),
            7 => Some(CipherAlgorithm::Twofish128),
            8 => Some(CipherAlgorithm::Twofish256),
            _ => None,
        }
    }

    /// Cipher block length in bytes. 4 for `none` so alignment arithmetic
    /// stays well-defined even when nothing is encrypted.
    pub const fn block_length(self) -> usize {
        match self {
            CipherAlgorithm::None => 4,
            CipherAlgorithm::TripleDes | CipherAlgorithm::Cast5 | CipherAlgorithm::Blowfish => 8,
            CipherAlgorithm::Aes128
            | CipherAlgorithm::Aes192
            | CipherAlgorithm::Aes256
            | CipherAlgorithm::Twofish128
            | CipherAlgorithm::Twofish256 => 16,
        }
    }

    /// Key length in bits, used to size session passwords and PKCS#1
    /// framing.
    pub const fn key_length_bits(self) -> usize {
        match self {
            CipherAlgorithm::None => 0,
            CipherAlgorithm::TripleDes => 192,
            CipherAlgorithm::Cast5 => 128,
            CipherAlgorithm::Blowfish => 128,
            CipherAlgorithm::Aes128 | CipherAlgorithm::Twofish128 => 128,
            CipherAlgorithm::Aes192 => 192,
            CipherAlgorithm::Aes256 | CipherAlgorithm::Twofish256 => 256,
        }
    }

    pub const fn is_none(self) -> bool {
        matches!(self, CipherAlgorithm::None)
    }
}

/// Whether an archive is protected with no crypt, a shared symmetric
/// password, or an RSA-wrapped session password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CryptType {
    None,
    Symmetric,
    Asymmetric,
}

/// Ordering the credential resolver uses to try the global password, the
/// job's configured password and an interactive prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PasswordMode {
    /// global, then job config, then prompt.
    Default,
    /// job config, then global, then prompt.
    Config,
    /// prompt only.
    Ask,
}
