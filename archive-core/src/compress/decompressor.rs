//! Streaming decompressor: compressed bytes fed in via [`Decompressor::put_block`],
//! plaintext drained out via [`Decompressor::inflate`].

use std::collections::VecDeque;

use archive_domain::{ArchiveError, CompressionAlgorithm};
use flate2::{Decompress, FlushDecompress, Status as FlateStatus};
use zstd::stream::raw::{Decoder as ZstdDecoder, InBuffer, Operation, OutBuffer};

const SCRATCH_LEN: usize = 64 * 1024;

enum Engine {
    None,
    Deflate(Box<Decompress>),
    Zstd(Box<ZstdDecoder<'static>>),
}

pub struct Decompressor {
    alg: CompressionAlgorithm,
    engine: Engine,
    /// Compressed bytes not yet consumed by the decoder.
    input: VecDeque<u8>,
    /// Decompressed bytes produced but not yet drained by `inflate`.
    output: VecDeque<u8>,
    scratch: Vec<u8>,
}

impl Decompressor {
    pub fn new(alg: CompressionAlgorithm) -> Result<Self, ArchiveError> {
        Ok(Self {
            alg,
            engine: Self::make_engine(alg)?,
            input: VecDeque::new(),
            output: VecDeque::new(),
            scratch: vec![0u8; SCRATCH_LEN],
        })
    }

    fn make_engine(alg: CompressionAlgorithm) -> Result<Engine, ArchiveError> {
        Ok(match alg {
            CompressionAlgorithm::None => Engine::None,
            CompressionAlgorithm::Deflate | CompressionAlgorithm::DeflateBest => {
                Engine::Deflate(Box::new(Decompress::new(false)))
            }
            CompressionAlgorithm::Zstd => {
                Engine::Zstd(Box::new(ZstdDecoder::new().map_err(|e| ArchiveError::CorruptData(e.to_string()))?))
            }
        })
    }

    /// Queues `buf` compressed bytes for decoding. The actual decode work
    /// happens lazily in `inflate`, since the caller controls how much
    /// plaintext it wants at a time.
    pub fn put_block(&mut self, buf: &[u8]) {
        self.input.extend(buf);
    }

    /// Decodes up to `n` bytes of plaintext into `out_buf[..n]`, pulling
    /// more compressed input from the queue as needed. Returns the number
    /// of bytes actually produced, which is less than `n` only when the
    /// input queue runs dry before satisfying the request.
    pub fn inflate(&mut self, out_buf: &mut [u8], n: usize) -> Result<usize, ArchiveError> {
        let want = n.min(out_buf.len());
        while self.output.len() < want && !self.input.is_empty() {
            self.run_decoder_once()?;
        }
        let produced = want.min(self.output.len());
        for slot in out_buf.iter_mut().take(produced) {
            *slot = self.output.pop_front().unwrap();
        }
        Ok(produced)
    }

    fn run_decoder_once(&mut self) -> Result<(), ArchiveError> {
        let chunk: Vec<u8> = self.input.drain(..self.input.len().min(SCRATCH_LEN)).collect();
        match &mut self.engine {
            Engine::None => {
                self.output.extend(chunk);
            }
            Engine::Deflate(decompress) => {
                let mut offset = 0;
                loop {
                    let before_out = decompress.total_out();
                    let before_in = decompress.total_in();
                    let status = decompress
                        .decompress(&chunk[offset..], &mut self.scratch, FlushDecompress::None)
                        .map_err(|e| ArchiveError::CorruptData(e.to_string()))?;
                    let out_n = (decompress.total_out() - before_out) as usize;
                    let in_n = (decompress.total_in() - before_in) as usize;
                    self.output.extend(&self.scratch[..out_n]);
                    offset += in_n;
                    if offset >= chunk.len() || status == FlateStatus::StreamEnd || (out_n == 0 && in_n == 0) {
                        break;
                    }
                }
            }
            Engine::Zstd(decoder) => {
                let mut in_buf = InBuffer::around(&chunk);
                while in_buf.pos < in_buf.src.len() {
                    let mut out_buf = OutBuffer::around(&mut self.scratch);
                    decoder.run(&mut in_buf, &mut out_buf).map_err(|e| ArchiveError::CorruptData(e.to_string()))?;
                    let n = out_buf.pos();
                    if n == 0 && in_buf.pos == 0 {
                        break;
                    }
                    self.output.extend(&self.scratch[..n]);
                }
            }
        }
        Ok(())
    }

    pub fn available_bytes(&self) -> usize {
        self.output.len()
    }

    pub fn reset(&mut self) -> Result<(), ArchiveError> {
        self.input.clear();
        self.output.clear();
        self.engine = Self::make_engine(self.alg)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::Compressor;

    #[test]
    fn roundtrip_deflate() {
        let mut c = Compressor::new(CompressionAlgorithm::Deflate, 64).unwrap();
        let input = b"the quick brown fox jumps over the lazy dog".repeat(50);
        c.deflate(&input).unwrap();
        c.flush().unwrap();
        let mut compressed = vec![0u8; c.available_bytes()];
        let n = c.get_block(&mut compressed);

        let mut d = Decompressor::new(CompressionAlgorithm::Deflate).unwrap();
        d.put_block(&compressed[..n]);
        let mut out = vec![0u8; input.len()];
        let produced = d.inflate(&mut out, input.len()).unwrap();
        assert_eq!(produced, input.len());
        assert_eq!(&out[..produced], &input[..]);
    }

    #[test]
    fn roundtrip_zstd() {
        let mut c = Compressor::new(CompressionAlgorithm::Zstd, 64).unwrap();
        let input = b"zstandard roundtrip payload ".repeat(200);
        c.deflate(&input).unwrap();
        c.flush().unwrap();
        let mut compressed = vec![0u8; c.available_bytes()];
        let n = c.get_block(&mut compressed);

        let mut d = Decompressor::new(CompressionAlgorithm::Zstd).unwrap();
        d.put_block(&compressed[..n]);
        let mut out = vec![0u8; input.len()];
        let produced = d.inflate(&mut out, input.len()).unwrap();
        assert_eq!(produced, input.len());
        assert_eq!(&out[..produced], &input[..]);
    }
}
