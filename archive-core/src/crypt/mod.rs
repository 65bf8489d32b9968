//! # Crypt primitives (C3)
//!
//! Block cipher dispatch ([`block_engine`]), per-chunk CBC+CTS state
//! ([`cipher_state`]) and RSA session-key wrap/unwrap ([`rsa_wrap`]) for
//! symmetric and asymmetric archives.

mod block_engine;
mod cipher_state;
mod rsa_wrap;

pub use cipher_state::CipherState;
pub use rsa_wrap::{
    create_key_pair, private_key_from_pem, private_key_to_pem, public_key_from_pem, public_key_to_pem,
    unwrap_session_key, wrap_session_key,
};
pub use rsa::{RsaPrivateKey, RsaPublicKey};

use archive_domain::CipherAlgorithm;
use secrecy::{ExposeSecret, SecretBox};

/// Derives an algorithm-specific key from a password: the first
/// `key_length_bits/8` bytes, zero-padded if the password is shorter.
/// Held in a `SecretBox` so the derived key is zeroized on drop just like
/// the password it came from.
pub fn derive_key(alg: CipherAlgorithm, password: &SecretBox<[u8]>) -> SecretBox<[u8]> {
    let key_len = alg.key_length_bits() / 8;
    let mut key = vec![0u8; key_len];
    let src = password.expose_secret();
    let n = src.len().min(key_len);
    key[..n].copy_from_slice(&src[..n]);
    SecretBox::new(key.into_boxed_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_key_pads_short_password() {
        let password = SecretBox::new(b"short".to_vec().into_boxed_slice());
        let key = derive_key(CipherAlgorithm::Aes256, &password);
        assert_eq!(key.expose_secret().len(), 32);
        assert_eq!(&key.expose_secret()[..5], b"short");
        assert!(key.expose_secret()[5..].iter().all(|&b| b == 0));
    }

    #[test]
    fn derive_key_truncates_long_password() {
        let password = SecretBox::new(vec![0x41u8; 64].into_boxed_slice());
        let key = derive_key(CipherAlgorithm::Aes128, &password);
        assert_eq!(key.expose_secret().len(), 16);
        assert!(key.expose_secret().iter().all(|&b| b == 0x41));
    }
}
