//! Writer/reader configuration (the `options` argument of `create`/`open`
//! in spec §4.6/§4.7), expressed as plain config structs the way the
//! teacher's job configuration types are.

use archive_domain::{CipherAlgorithm, CompressionAlgorithm, CryptType, PasswordMode};
use secrecy::SecretBox;
use serde::{Deserialize, Serialize};

use crate::crypt::RsaPublicKey;

/// Non-secret archive writer settings; passwords and keys are passed
/// alongside, not inside, this struct so it stays `Serialize`/`Deserialize`
/// for job configuration storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveWriterConfig {
    pub archive_name: String,
    pub compress_algorithm: CompressionAlgorithm,
    pub cipher_algorithm: CipherAlgorithm,
    pub crypt_type: CryptType,
    /// 0 disables splitting: the whole archive is a single part.
    pub max_part_size: u64,
}

impl Default for ArchiveWriterConfig {
    fn default() -> Self {
        Self {
            archive_name: "archive".to_string(),
            compress_algorithm: CompressionAlgorithm::None,
            cipher_algorithm: CipherAlgorithm::None,
            crypt_type: CryptType::None,
            max_part_size: 0,
        }
    }
}

/// Secrets the writer needs that never get serialized alongside
/// `ArchiveWriterConfig`: the symmetric password (if any) and the RSA
/// public key (if asymmetric).
pub struct ArchiveWriterSecrets {
    pub password: Option<SecretBox<[u8]>>,
    pub public_key: Option<RsaPublicKey>,
}

impl Default for ArchiveWriterSecrets {
    fn default() -> Self {
        Self { password: None, public_key: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveReaderConfig {
    pub archive_name: String,
    pub password_mode: PasswordMode,
    pub skip_unknown: bool,
}

impl Default for ArchiveReaderConfig {
    fn default() -> Self {
        Self { archive_name: "archive".to_string(), password_mode: PasswordMode::Default, skip_unknown: true }
    }
}

pub struct ArchiveReaderSecrets {
    pub global_password: Option<SecretBox<[u8]>>,
    pub job_password: Option<SecretBox<[u8]>>,
    pub private_key: Option<crate::crypt::RsaPrivateKey>,
}

impl Default for ArchiveReaderSecrets {
    fn default() -> Self {
        Self { global_password: None, job_password: None, private_key: None }
    }
}
