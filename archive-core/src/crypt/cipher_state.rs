//! # Per-chunk cipher state (C3)
//!
//! Implements CBC with ciphertext stealing (CTS) incrementally, so the
//! archive writer can hand it one compressed block at a time (spec: "Per-chunk
//! cipher state is reset at chunk open") without buffering a whole fragment.
//!
//! ## Why streaming CTS needs a two-block lookback
//!
//! CBC-CTS folds the *last* full block and the trailing short block together
//! (it "steals" ciphertext bytes from the last full block to pad the short
//! one, rather than expanding the output). That means the last full block
//! can't be finalized until we know whether a short block follows it. This
//! state holds back up to two block-lengths of buffered input and only
//! emits a block once a third block's worth of data has arrived to prove it
//! isn't part of the final pair. [`CipherState::finish`] resolves whatever
//! is left (0, 1, or up to 2 blocks) when the fragment ends.
//!
//! This is an Open Question resolution (see `DESIGN.md`): spec §4.3 states
//! the raw `encrypt`/`decrypt` primitive requires block-aligned input, while
//! spec §3 says the payload as a whole uses CBC+CTS. The two are reconciled
//! here by doing plain block-aligned CBC for every interior block and
//! applying the CS3 stealing construction only to the final 1-2 blocks.

use archive_domain::{ArchiveError, CipherAlgorithm};

use super::block_engine::{cbc_decrypt_block, cbc_encrypt_block, BlockEngine};

enum Mode {
    Encrypt,
    Decrypt,
}

/// Cipher state bound to one entry-meta, data-header, or data-payload
/// sub-chunk. Reset at chunk open and again whenever a fragment boundary
/// requires a fresh, deterministic IV (spec: "seed an IV from a 64-bit
/// seed... so re-encrypting the same plaintext at the same offset yields
/// the same ciphertext").
pub struct CipherState {
    engine: Option<BlockEngine>,
    iv: Vec<u8>,
    /// Buffered plaintext (encrypt) or ciphertext (decrypt) not yet emitted.
    pending: Vec<u8>,
    mode: Mode,
}

impl CipherState {
    pub fn new_encryptor(alg: CipherAlgorithm, key: &[u8]) -> Result<Self, ArchiveError> {
        Self::new(alg, key, Mode::Encrypt)
    }

    pub fn new_decryptor(alg: CipherAlgorithm, key: &[u8]) -> Result<Self, ArchiveError> {
        Self::new(alg, key, Mode::Decrypt)
    }

    fn new(alg: CipherAlgorithm, key: &[u8], mode: Mode) -> Result<Self, ArchiveError> {
        if alg.is_none() {
            return Ok(Self { engine: None, iv: vec![0; 4], pending: Vec::new(), mode });
        }
        let engine = BlockEngine::new(alg, key)?;
        let block_len = engine.block_len();
        Ok(Self { engine: Some(engine), iv: vec![0u8; block_len], pending: Vec::new(), mode })
    }

    pub fn block_length(&self) -> usize {
        match &self.engine {
            Some(e) => e.block_len(),
            None => 4,
        }
    }

    pub fn is_none(&self) -> bool {
        self.engine.is_none()
    }

    /// Seeds the IV from a 64-bit value (typically the enclosing fragment's
    /// byte offset) and clears any buffered partial block.
    pub fn reset(&mut self, seed: u64) {
        let seed_bytes = seed.to_be_bytes();
        for (i, b) in self.iv.iter_mut().enumerate() {
            *b = seed_bytes[i % 8];
        }
        self.pending.clear();
    }

    /// Block-aligned, non-streaming encrypt/decrypt used for the small
    /// fixed-field areas (entry-meta, data-header), which are always padded
    /// to a block multiple before this is called. No ciphertext stealing:
    /// plain CBC.
    pub fn encrypt(&mut self, buf: &mut [u8]) -> Result<(), ArchiveError> {
        let Some(engine) = &self.engine else { return Ok(()) };
        let block_len = engine.block_len();
        if buf.len() % block_len != 0 {
            return Err(ArchiveError::InvalidBlockLength(buf.len()));
        }
        let mut prev = self.iv.clone();
        for block in buf.chunks_mut(block_len) {
            let out = cbc_encrypt_block(engine, &prev, block);
            block.copy_from_slice(&out);
            prev = out;
        }
        self.iv = prev;
        Ok(())
    }

    pub fn decrypt(&mut self, buf: &mut [u8]) -> Result<(), ArchiveError> {
        let Some(engine) = &self.engine else { return Ok(()) };
        let block_len = engine.block_len();
        if buf.len() % block_len != 0 {
            return Err(ArchiveError::InvalidBlockLength(buf.len()));
        }
        let mut prev = self.iv.clone();
        for block in buf.chunks_mut(block_len) {
            let ct = block.to_vec();
            let out = cbc_decrypt_block(engine, &prev, block);
            block.copy_from_slice(&out);
            prev = ct;
        }
        self.iv = prev;
        Ok(())
    }

    /// Feeds `input` plaintext bytes into the streaming encryptor, returning
    /// whatever ciphertext can be safely emitted now (everything except the
    /// trailing 1-2 blocks, which must wait for [`CipherState::finish`]).
    pub fn encrypt_stream(&mut self, input: &[u8]) -> Result<Vec<u8>, ArchiveError> {
        debug_assert!(matches!(self.mode, Mode::Encrypt));
        let Some(engine) = &self.engine else { return Ok(input.to_vec()) };
        let block_len = engine.block_len();
        self.pending.extend_from_slice(input);
        let mut out = Vec::new();
        while self.pending.len() > 2 * block_len {
            let block: Vec<u8> = self.pending.drain(0..block_len).collect();
            let ct = cbc_encrypt_block(engine, &self.iv, &block);
            self.iv = ct.clone();
            out.extend(ct);
        }
        Ok(out)
    }

    /// Feeds `input` ciphertext bytes into the streaming decryptor,
    /// returning whatever plaintext can be safely emitted now.
    pub fn decrypt_stream(&mut self, input: &[u8]) -> Result<Vec<u8>, ArchiveError> {
        debug_assert!(matches!(self.mode, Mode::Decrypt));
        let Some(engine) = &self.engine else { return Ok(input.to_vec()) };
        let block_len = engine.block_len();
        self.pending.extend_from_slice(input);
        let mut out = Vec::new();
        while self.pending.len() > 2 * block_len {
            let block: Vec<u8> = self.pending.drain(0..block_len).collect();
            let pt = cbc_decrypt_block(engine, &self.iv, &block);
            self.iv = block;
            out.extend(pt);
        }
        Ok(out)
    }

    /// Resolves whatever is left in the pending buffer at end of fragment.
    /// Applies CS3 ciphertext stealing when the tail is a full block plus a
    /// short remainder; falls back to a single zero-padded block when the
    /// entire fragment was shorter than one block (a harmless, documented
    /// size expansion for sub-block fragments).
    pub fn finish(&mut self) -> Result<Vec<u8>, ArchiveError> {
        let Some(engine) = &self.engine else {
            return Ok(std::mem::take(&mut self.pending));
        };
        let block_len = engine.block_len();
        if self.pending.is_empty() {
            return Ok(Vec::new());
        }
        let out = match self.mode {
            Mode::Encrypt => finish_encrypt(engine, &self.iv, &self.pending, block_len),
            Mode::Decrypt => finish_decrypt(engine, &self.iv, &self.pending, block_len),
        };
        self.pending.clear();
        Ok(out)
    }
}

fn zero_xor_tail(buf: &mut [u8], from: usize) {
    // no-op: XOR with zero bytes leaves `buf[from..]` unchanged. Kept as a
    // named step so the CS3 derivation below reads the same as its proof.
    let _ = (buf, from);
}

fn finish_encrypt(engine: &BlockEngine, iv: &[u8], pending: &[u8], block_len: usize) -> Vec<u8> {
    if pending.len() <= block_len {
        let mut block = pending.to_vec();
        block.resize(block_len, 0);
        return cbc_encrypt_block(engine, iv, &block);
    }
    let d = pending.len() - block_len;
    let last_full = &pending[..block_len];
    let tail = &pending[block_len..];
    if d == block_len {
        // exactly two full blocks: no stealing required.
        let c0 = cbc_encrypt_block(engine, iv, last_full);
        let c1 = cbc_encrypt_block(engine, &c0, tail);
        let mut out = c0;
        out.extend(c1);
        return out;
    }
    let en_1 = cbc_encrypt_block(engine, iv, last_full);
    let c_n = en_1[..d].to_vec();
    let mut p_n_padded = tail.to_vec();
    p_n_padded.resize(block_len, 0);
    zero_xor_tail(&mut p_n_padded, d);
    let c_full = cbc_encrypt_block(engine, &en_1, &p_n_padded);
    let mut out = c_full;
    out.extend(c_n);
    out
}

fn finish_decrypt(engine: &BlockEngine, iv: &[u8], pending: &[u8], block_len: usize) -> Vec<u8> {
    if pending.len() <= block_len {
        let mut block = pending.to_vec();
        block.resize(block_len, 0);
        return cbc_decrypt_block(engine, iv, &block);
    }
    let d = pending.len() - block_len;
    let c_full = &pending[..block_len];
    let c_n = &pending[block_len..];
    if d == block_len {
        let p0 = cbc_decrypt_block(engine, iv, c_full);
        let p1 = cbc_decrypt_block(engine, c_full, c_n);
        let mut out = p0;
        out.extend(p1);
        return out;
    }
    let x = {
        let mut b = c_full.to_vec();
        engine.decrypt_block(&mut b);
        b
    };
    // en_1 = c_n (first d bytes) || x[d..] (x's tail equals en_1's tail
    // because the padding XORed into it at encrypt time was zero).
    let mut en_1 = c_n.to_vec();
    en_1.extend_from_slice(&x[d..]);
    let mut p_last = vec![0u8; d];
    for i in 0..d {
        p_last[i] = x[i] ^ c_n[i];
    }
    let p_full_last = cbc_decrypt_block(engine, iv, &en_1);
    let mut out = p_full_last;
    out.extend(p_last);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(alg: CipherAlgorithm, key: &[u8], plaintext: &[u8]) {
        let mut enc = CipherState::new_encryptor(alg, key).unwrap();
        enc.reset(42);
        let mut ciphertext = enc.encrypt_stream(plaintext).unwrap();
        ciphertext.extend(enc.finish().unwrap());

        let mut dec = CipherState::new_decryptor(alg, key).unwrap();
        dec.reset(42);
        let mut plain_out = dec.decrypt_stream(&ciphertext).unwrap();
        plain_out.extend(dec.finish().unwrap());

        assert_eq!(&plain_out[..plaintext.len()], plaintext);
    }

    #[test]
    fn aes256_roundtrip_various_lengths() {
        let key = [7u8; 32];
        for len in [0usize, 1, 8, 15, 16, 17, 31, 32, 33, 1000, 1000 * 64 + 5] {
            let plaintext: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            roundtrip(CipherAlgorithm::Aes256, &key, &plaintext);
        }
    }

    #[test]
    fn blowfish_roundtrip() {
        let key = [3u8; 16];
        roundtrip(CipherAlgorithm::Blowfish, &key, b"hello ciphertext stealing world!");
    }

    #[test]
    fn deterministic_iv_reset_same_ciphertext() {
        let key = [9u8; 32];
        let plaintext = b"same offset, same bytes, same ciphertext";
        let mut a = CipherState::new_encryptor(CipherAlgorithm::Aes256, &key).unwrap();
        a.reset(1000);
        let mut ca = a.encrypt_stream(plaintext).unwrap();
        ca.extend(a.finish().unwrap());

        let mut b = CipherState::new_encryptor(CipherAlgorithm::Aes256, &key).unwrap();
        b.reset(1000);
        let mut cb = b.encrypt_stream(plaintext).unwrap();
        cb.extend(b.finish().unwrap());

        assert_eq!(ca, cb);
    }
}
