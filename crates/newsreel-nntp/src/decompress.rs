//! Incremental inflater for compressed multi-line bodies.
//!
//! The compressed body is a zlib stream ([RFC 1950](https://datatracker.ietf.org/doc/html/rfc1950))
//! whose inflated content is an ordinary dot-terminated body, so the
//! [`MultilineFramer`](crate::framer::MultilineFramer) downstream never needs
//! to know compression was involved.

use flate2::{Decompress, FlushDecompress, Status};

use crate::error::NntpError;

const INFLATE_BUF_SIZE: usize = 8192;

#[derive(Debug)]
pub struct Decompressor {
    inflate: Decompress,
    finished: bool,
}

impl Decompressor {
    pub fn new() -> Self {
        Self {
            inflate: Decompress::new(true),
            finished: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Inflates `chunk`, returning whatever plain bytes it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<u8>, NntpError> {
        if chunk.is_empty() {
            return Ok(Vec::new());
        }
        let mut out = Vec::with_capacity(INFLATE_BUF_SIZE.max(chunk.len() * 4));
        let mut input = chunk;

        while !self.finished {
            if out.len() == out.capacity() {
                out.reserve(INFLATE_BUF_SIZE);
            }
            let before_in = self.inflate.total_in();
            let before_out = self.inflate.total_out();

            let status = self
                .inflate
                .decompress_vec(input, &mut out, FlushDecompress::None)
                .map_err(|e| NntpError::Decompress(e.to_string()))?;

            let consumed = (self.inflate.total_in() - before_in) as usize;
            let produced = (self.inflate.total_out() - before_out) as usize;
            input = &input[consumed..];

            if status == Status::StreamEnd {
                self.finished = true;
                break;
            }
            // A full output buffer may hide more pending output.
            let out_full = out.len() == out.capacity();
            if !out_full && (input.is_empty() || (consumed == 0 && produced == 0)) {
                break;
            }
        }

        if self.finished && !input.is_empty() {
            tracing::debug!(
                "ignoring {} bytes after end of compressed stream",
                input.len()
            );
        }
        Ok(out)
    }
}

impl Default for Decompressor {
    fn default() -> Self {
        Self::new()
    }
}
