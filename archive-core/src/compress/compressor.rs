//! Streaming compressor: plaintext in, block-granular compressed output
//! out, backed by `flate2::Compress` (deflate/deflate-best) or
//! `zstd::stream::raw::Encoder` (zstd).

use std::collections::VecDeque;

use archive_domain::{ArchiveError, CompressionAlgorithm};
use flate2::{Compress, Compression, FlushCompress, Status as FlateStatus};
use zstd::stream::raw::{Encoder as ZstdEncoder, InBuffer, Operation, OutBuffer};

use super::BlockGranularity;

const SCRATCH_LEN: usize = 64 * 1024;
const ZSTD_LEVEL: i32 = 3;

enum Engine {
    None,
    Deflate(Box<Compress>),
    Zstd(Box<ZstdEncoder<'static>>),
}

/// A deflate/zstd encoder that buffers produced bytes until the caller
/// drains them with [`Compressor::get_block`], so the writer can hold off
/// emitting a fragment until a full `block_length` worth of output exists.
pub struct Compressor {
    alg: CompressionAlgorithm,
    block_length: usize,
    engine: Engine,
    output: VecDeque<u8>,
    input_length: u64,
    scratch: Vec<u8>,
}

impl Compressor {
    pub fn new(alg: CompressionAlgorithm, block_length: usize) -> Result<Self, ArchiveError> {
        Ok(Self {
            alg,
            block_length: block_length.max(1),
            engine: Self::make_engine(alg)?,
            output: VecDeque::new(),
            input_length: 0,
            scratch: vec![0u8; SCRATCH_LEN],
        })
    }

    fn make_engine(alg: CompressionAlgorithm) -> Result<Engine, ArchiveError> {
        Ok(match alg {
            CompressionAlgorithm::None => Engine::None,
            CompressionAlgorithm::Deflate => Engine::Deflate(Box::new(Compress::new(Compression::default(), false))),
            CompressionAlgorithm::DeflateBest => Engine::Deflate(Box::new(Compress::new(Compression::best(), false))),
            CompressionAlgorithm::Zstd => Engine::Zstd(Box::new(
                ZstdEncoder::new(ZSTD_LEVEL).map_err(|e| ArchiveError::CorruptData(e.to_string()))?,
            )),
        })
    }

    /// Feeds `input` plaintext bytes through the encoder, returning the
    /// number of compressed bytes newly buffered (also retrievable via
    /// `available_bytes`).
    pub fn deflate(&mut self, input: &[u8]) -> Result<usize, ArchiveError> {
        self.input_length += input.len() as u64;
        match &mut self.engine {
            Engine::None => {
                self.output.extend(input);
                Ok(input.len())
            }
            Engine::Deflate(compress) => {
                let mut produced = 0;
                let mut offset = 0;
                loop {
                    let before_out = compress.total_out();
                    let before_in = compress.total_in();
                    let status = compress
                        .compress(&input[offset..], &mut self.scratch, FlushCompress::None)
                        .map_err(|e| ArchiveError::CorruptData(e.to_string()))?;
                    let out_n = (compress.total_out() - before_out) as usize;
                    let in_n = (compress.total_in() - before_in) as usize;
                    self.output.extend(&self.scratch[..out_n]);
                    produced += out_n;
                    offset += in_n;
                    if offset >= input.len() || status == FlateStatus::StreamEnd {
                        break;
                    }
                }
                Ok(produced)
            }
            Engine::Zstd(encoder) => {
                let mut produced = 0;
                let mut in_buf = InBuffer::around(input);
                while in_buf.pos < in_buf.src.len() {
                    let mut out_buf = OutBuffer::around(&mut self.scratch);
                    encoder.run(&mut in_buf, &mut out_buf).map_err(|e| ArchiveError::CorruptData(e.to_string()))?;
                    let n = out_buf.pos();
                    self.output.extend(&self.scratch[..n]);
                    produced += n;
                }
                Ok(produced)
            }
        }
    }

    /// Finalizes the stream, flushing any internally buffered state. After
    /// this call no more `deflate` calls are valid until `reset`.
    pub fn flush(&mut self) -> Result<(), ArchiveError> {
        match &mut self.engine {
            Engine::None => Ok(()),
            Engine::Deflate(compress) => loop {
                let before_out = compress.total_out();
                let status = compress
                    .compress(&[], &mut self.scratch, FlushCompress::Finish)
                    .map_err(|e| ArchiveError::CorruptData(e.to_string()))?;
                let out_n = (compress.total_out() - before_out) as usize;
                self.output.extend(&self.scratch[..out_n]);
                if status == FlateStatus::StreamEnd {
                    return Ok(());
                }
            },
            Engine::Zstd(encoder) => loop {
                let mut out_buf = OutBuffer::around(&mut self.scratch);
                let remaining = encoder.finish(&mut out_buf, true).map_err(|e| ArchiveError::CorruptData(e.to_string()))?;
                let n = out_buf.pos();
                self.output.extend(&self.scratch[..n]);
                if remaining == 0 {
                    return Ok(());
                }
            },
        }
    }

    /// Drains one block (`out_buf.len()`, typically `block_length`) of
    /// compressed output, returning how many bytes were written.
    pub fn get_block(&mut self, out_buf: &mut [u8]) -> usize {
        let n = out_buf.len().min(self.output.len());
        for slot in out_buf.iter_mut().take(n) {
            *slot = self.output.pop_front().unwrap();
        }
        n
    }

    pub fn available_blocks(&self, granularity: BlockGranularity) -> usize {
        match granularity {
            BlockGranularity::Full => self.output.len() / self.block_length,
            BlockGranularity::Any => {
                if self.output.is_empty() {
                    0
                } else {
                    self.output.len().div_ceil(self.block_length)
                }
            }
        }
    }

    pub fn available_bytes(&self) -> usize {
        self.output.len()
    }

    pub fn input_length(&self) -> u64 {
        self.input_length
    }

    /// Clears buffered output and reinitializes the underlying engine,
    /// starting a fresh compression stream for the next fragment.
    pub fn reset(&mut self) -> Result<(), ArchiveError> {
        self.output.clear();
        self.input_length = 0;
        self.engine = Self::make_engine(self.alg)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_algorithm_is_passthrough() {
        let mut c = Compressor::new(CompressionAlgorithm::None, 16).unwrap();
        c.deflate(b"hello world").unwrap();
        c.flush().unwrap();
        assert_eq!(c.available_bytes(), 11);
        let mut out = vec![0u8; 11];
        let n = c.get_block(&mut out);
        assert_eq!(&out[..n], b"hello world");
    }

    #[test]
    fn deflate_produces_nonempty_output_for_repetitive_input() {
        let mut c = Compressor::new(CompressionAlgorithm::Deflate, 64).unwrap();
        let input = vec![b'a'; 10_000];
        c.deflate(&input).unwrap();
        c.flush().unwrap();
        assert!(c.available_bytes() > 0);
        assert!(c.available_bytes() < input.len());
        assert_eq!(c.input_length(), 10_000);
    }

    #[test]
    fn reset_clears_state() {
        let mut c = Compressor::new(CompressionAlgorithm::Deflate, 64).unwrap();
        c.deflate(b"some data").unwrap();
        c.flush().unwrap();
        c.reset().unwrap();
        assert_eq!(c.available_bytes(), 0);
        assert_eq!(c.input_length(), 0);
    }
}
