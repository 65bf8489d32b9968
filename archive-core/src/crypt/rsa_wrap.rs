//! Asymmetric session-key wrapping for `CryptType::Asymmetric` archives.
//!
//! The archive carries no RSA-encrypted payload data: RSA only wraps the
//! random per-archive session password inside the `KEY` chunk, using the
//! classic PKCS#1 v1.5 type-2 padding (`0x00 0x02 PS 0x00 K`, `PS` random
//! non-zero bytes long enough to fill the modulus). The `rsa` crate already
//! implements this scheme end to end (`Pkcs1v15Encrypt`); we still model
//! `wrap_session_key`/`unwrap_session_key` as explicit functions rather than
//! calling the crate inline at call sites, because the archive writer/reader
//! need the error mapped onto `ArchiveError` and the "wrong private key"
//! case distinguished from generic decrypt failure.

use archive_domain::ArchiveError;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::rand_core::OsRng;
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};

/// Generates a fresh RSA keypair. Archive setup scripts call this once to
/// produce the public/private key pair handed to `write_key`.
pub fn create_key_pair(bits: usize) -> Result<(RsaPrivateKey, RsaPublicKey), ArchiveError> {
    let mut rng = OsRng;
    let private = RsaPrivateKey::new(&mut rng, bits)
        .map_err(|e| ArchiveError::CreateKeyFail(e.to_string()))?;
    let public = RsaPublicKey::from(&private);
    Ok((private, public))
}

pub fn public_key_to_pem(key: &RsaPublicKey) -> Result<String, ArchiveError> {
    key.to_pkcs1_pem(rsa::pkcs8::LineEnding::LF)
        .map_err(|e| ArchiveError::InvalidKey(e.to_string()))
}

pub fn public_key_from_pem(pem: &str) -> Result<RsaPublicKey, ArchiveError> {
    RsaPublicKey::from_pkcs1_pem(pem).map_err(|e| ArchiveError::InvalidKey(e.to_string()))
}

pub fn private_key_to_pem(key: &RsaPrivateKey) -> Result<String, ArchiveError> {
    key.to_pkcs1_pem(rsa::pkcs8::LineEnding::LF)
        .map(|s| s.to_string())
        .map_err(|e| ArchiveError::InvalidKey(e.to_string()))
}

pub fn private_key_from_pem(pem: &str) -> Result<RsaPrivateKey, ArchiveError> {
    RsaPrivateKey::from_pkcs1_pem(pem).map_err(|e| ArchiveError::InvalidKey(e.to_string()))
}

/// Wraps a session password under the archive's public key, producing the
/// `KEY` chunk payload. `session_key` must be short enough to fit the
/// PKCS#1 v1.5 type-2 envelope (`modulus_len - 11` bytes).
pub fn wrap_session_key(public_key: &RsaPublicKey, session_key: &[u8]) -> Result<Vec<u8>, ArchiveError> {
    let mut rng = OsRng;
    public_key
        .encrypt(&mut rng, Pkcs1v15Encrypt, session_key)
        .map_err(|e| ArchiveError::EncryptFail(e.to_string()))
}

/// Unwraps a `KEY` chunk payload with the archive's private key. A
/// decryption failure here almost always means the wrong keypair was
/// supplied for this archive, so it is reported as `WrongPrivateKey` rather
/// than the more generic `DecryptFail`.
pub fn unwrap_session_key(private_key: &RsaPrivateKey, wrapped: &[u8]) -> Result<Vec<u8>, ArchiveError> {
    private_key
        .decrypt(Pkcs1v15Encrypt, wrapped)
        .map_err(|_| ArchiveError::WrongPrivateKey)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_unwrap_roundtrip() {
        let (private, public) = create_key_pair(1024).unwrap();
        let session_key = [0x5a_u8; 32];
        let wrapped = wrap_session_key(&public, &session_key).unwrap();
        let unwrapped = unwrap_session_key(&private, &wrapped).unwrap();
        assert_eq!(unwrapped, session_key);
    }

    #[test]
    fn wrong_private_key_is_reported() {
        let (_, public) = create_key_pair(1024).unwrap();
        let (other_private, _) = create_key_pair(1024).unwrap();
        let wrapped = wrap_session_key(&public, b"session-key-bytes").unwrap();
        let err = unwrap_session_key(&other_private, &wrapped).unwrap_err();
        assert!(matches!(err, ArchiveError::WrongPrivateKey));
    }

    #[test]
    fn pem_roundtrip() {
        let (private, public) = create_key_pair(1024).unwrap();
        let pub_pem = public_key_to_pem(&public).unwrap();
        let priv_pem = private_key_to_pem(&private).unwrap();
        assert_eq!(public_key_from_pem(&pub_pem).unwrap(), public);
        assert_eq!(
            private_key_from_pem(&priv_pem).unwrap().to_public_key(),
            private.to_public_key()
        );
    }
}
