//! Single-block encrypt/decrypt dispatch across the symmetric algorithms
//! named in spec §6 (`{none, 3DES, CAST5, Blowfish, AES128/192/256,
//! Twofish128/256}`), backed by the RustCrypto block cipher crates.

use archive_domain::{ArchiveError, CipherAlgorithm};
use cipher::{Block, BlockDecrypt, BlockEncrypt, KeyInit};

pub enum BlockEngine {
    TripleDes(des::TdesEde3),
    Cast5(cast5::Cast5),
    Blowfish(blowfish::Blowfish),
    Aes128(aes::Aes128),
    Aes192(aes::Aes192),
    Aes256(aes::Aes256),
    Twofish(twofish::Twofish),
}

fn encrypt_with<C: BlockEncrypt>(c: &C, block: &mut [u8]) {
    let mut b = Block::<C>::clone_from_slice(block);
    c.encrypt_block(&mut b);
    block.copy_from_slice(&b);
}

fn decrypt_with<C: BlockDecrypt>(c: &C, block: &mut [u8]) {
    let mut b = Block::<C>::clone_from_slice(block);
    c.decrypt_block(&mut b);
    block.copy_from_slice(&b);
}

impl BlockEngine {
    pub fn new(alg: CipherAlgorithm, key: &[u8]) -> Result<Self, ArchiveError> {
        let bad_len = || ArchiveError::InvalidKeyLength(key.len());
        Ok(match alg {
            CipherAlgorithm::None => {
                return Err(ArchiveError::InvalidKey("cipher algorithm \"none\" has no block engine".into()))
            }
            CipherAlgorithm::TripleDes => BlockEngine::TripleDes(des::TdesEde3::new_from_slice(key).map_err(|_| bad_len())?),
            CipherAlgorithm::Cast5 => BlockEngine::Cast5(cast5::Cast5::new_from_slice(key).map_err(|_| bad_len())?),
            CipherAlgorithm::Blowfish => BlockEngine::Blowfish(blowfish::Blowfish::new_from_slice(key).map_err(|_| bad_len())?),
            CipherAlgorithm::Aes128 => BlockEngine::Aes128(aes::Aes128::new_from_slice(key).map_err(|_| bad_len())?),
            CipherAlgorithm::Aes192 => BlockEngine::Aes192(aes::Aes192::new_from_slice(key).map_err(|_| bad_len())?),
            CipherAlgorithm::Aes256 => BlockEngine::Aes256(aes::Aes256::new_from_slice(key).map_err(|_| bad_len())?),
            CipherAlgorithm::Twofish128 | CipherAlgorithm::Twofish256 => {
                BlockEngine::Twofish(twofish::Twofish::new_from_slice(key).map_err(|_| bad_len())?)
            }
        })
    }

    pub fn block_len(&self) -> usize {
        match self {
            BlockEngine::TripleDes(_) | BlockEngine::Cast5(_) | BlockEngine::Blowfish(_) => 8,
            BlockEngine::Aes128(_) | BlockEngine::Aes192(_) | BlockEngine::Aes256(_) | BlockEngine::Twofish(_) => 16,
        }
    }

    pub fn encrypt_block(&self, block: &mut [u8]) {
        match self {
            BlockEngine::TripleDes(c) => encrypt_with(c, block),
            BlockEngine::Cast5(c) => encrypt_with(c, block),
            BlockEngine::Blowfish(c) => encrypt_with(c, block),
            BlockEngine::Aes128(c) => encrypt_with(c, block),
            BlockEngine::Aes192(c) => encrypt_with(c, block),
            BlockEngine::Aes256(c) => encrypt_with(c, block),
            BlockEngine::Twofish(c) => encrypt_with(c, block),
        }
    }

    pub fn decrypt_block(&self, block: &mut [u8]) {
        match self {
            BlockEngine::TripleDes(c) => decrypt_with(c, block),
            BlockEngine::Cast5(c) => decrypt_with(c, block),
            BlockEngine::Blowfish(c) => decrypt_with(c, block),
            BlockEngine::Aes128(c) => decrypt_with(c, block),
            BlockEngine::Aes192(c) => decrypt_with(c, block),
            BlockEngine::Aes256(c) => decrypt_with(c, block),
            BlockEngine::Twofish(c) => decrypt_with(c, block),
        }
    }
}

fn xor_in_place(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= s;
    }
}

pub(crate) fn cbc_encrypt_block(engine: &BlockEngine, prev: &[u8], plain: &[u8]) -> Vec<u8> {
    let mut block = plain.to_vec();
    xor_in_place(&mut block, prev);
    engine.encrypt_block(&mut block);
    block
}

pub(crate) fn cbc_decrypt_block(engine: &BlockEngine, prev: &[u8], cipher: &[u8]) -> Vec<u8> {
    let mut block = cipher.to_vec();
    engine.decrypt_block(&mut block);
    xor_in_place(&mut block, prev);
    block
}
