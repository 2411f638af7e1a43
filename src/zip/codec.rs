use flate2::{Compress, Compression, FlushCompress, Status};

use super::structures::CompressionMethod;
use crate::error::{Result, ZipError};

/// Staging buffer size for compressed output, per compressor call.
const STAGE_SIZE: usize = 32 * 1024;

/// Streaming encoder for one archive entry.
///
/// Consumes input in bounded chunks and appends encoded bytes to a
/// caller-provided staging buffer, so memory use is independent of entry
/// size. Encoding is deterministic: the same byte sequence at the same
/// level always yields identical output.
///
/// DEFLATE here is the raw stream (no zlib wrapper), which is what the
/// ZIP container stores. STORE copies bytes unchanged.
pub struct Encoder {
    kind: Kind,
}

enum Kind {
    Deflate(Compress),
    Store { bytes: u64 },
}

impl Encoder {
    /// Raw-DEFLATE encoder at the given level (0-9).
    pub fn deflate(level: u32) -> Self {
        Self {
            kind: Kind::Deflate(Compress::new(Compression::new(level), false)),
        }
    }

    /// Pass-through encoder (method STORE).
    pub fn store() -> Self {
        Self {
            kind: Kind::Store { bytes: 0 },
        }
    }

    pub fn method(&self) -> CompressionMethod {
        match self.kind {
            Kind::Deflate(_) => CompressionMethod::Deflate,
            Kind::Store { .. } => CompressionMethod::Stored,
        }
    }

    /// Encode one input chunk, appending output bytes to `out`.
    ///
    /// The whole chunk is always consumed; `out` grows by at most the
    /// chunk size plus the DEFLATE worst-case overhead.
    pub fn encode_chunk(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<()> {
        match &mut self.kind {
            Kind::Store { bytes } => {
                out.extend_from_slice(input);
                *bytes += input.len() as u64;
                Ok(())
            }
            Kind::Deflate(compress) => {
                let mut stage = [0u8; STAGE_SIZE];
                let mut offset = 0;
                while offset < input.len() {
                    let before_in = compress.total_in();
                    let before_out = compress.total_out();
                    compress
                        .compress(&input[offset..], &mut stage, FlushCompress::None)
                        .map_err(|e| ZipError::Codec(e.to_string()))?;
                    let consumed = (compress.total_in() - before_in) as usize;
                    let produced = (compress.total_out() - before_out) as usize;
                    out.extend_from_slice(&stage[..produced]);
                    if consumed == 0 && produced == 0 {
                        return Err(ZipError::Codec(
                            "deflate stream made no progress".to_string(),
                        ));
                    }
                    offset += consumed;
                }
                Ok(())
            }
        }
    }

    /// Flush the encoder, appending any trailing output bytes to `out`.
    pub fn finish(&mut self, out: &mut Vec<u8>) -> Result<()> {
        match &mut self.kind {
            Kind::Store { .. } => Ok(()),
            Kind::Deflate(compress) => {
                let mut stage = [0u8; STAGE_SIZE];
                loop {
                    let before_out = compress.total_out();
                    let status = compress
                        .compress(&[], &mut stage, FlushCompress::Finish)
                        .map_err(|e| ZipError::Codec(e.to_string()))?;
                    let produced = (compress.total_out() - before_out) as usize;
                    out.extend_from_slice(&stage[..produced]);
                    if status == Status::StreamEnd {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Uncompressed bytes consumed so far.
    pub fn total_in(&self) -> u64 {
        match &self.kind {
            Kind::Deflate(c) => c.total_in(),
            Kind::Store { bytes } => *bytes,
        }
    }

    /// Encoded bytes emitted so far.
    pub fn total_out(&self) -> u64 {
        match &self.kind {
            Kind::Deflate(c) => c.total_out(),
            Kind::Store { bytes } => *bytes,
        }
    }
}
