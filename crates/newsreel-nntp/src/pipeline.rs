//! One-shot response pipeline.
//!
//! A [`ResponsePipeline`] is assembled for a single command and wires the
//! stages in order: status-line splitter, optional [`Decompressor`],
//! [`MultilineFramer`], [`ResponseParser`]. Bytes are pushed in as they come
//! off the socket; the pipeline yields exactly one [`Response`].

use crate::decompress::Decompressor;
use crate::error::NntpError;
use crate::framer::{MultilineFramer, StatusLineSplitter};
use crate::model::Response;
use crate::parser::{ResponseMode, ResponseParser};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    SingleLine,
    MultiLine,
    CompressedMultiLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    AwaitStatus,
    AwaitBody,
    Complete,
}

#[derive(Debug)]
pub struct ResponsePipeline {
    stage: Stage,
    splitter: StatusLineSplitter,
    decompressor: Option<Decompressor>,
    framer: MultilineFramer,
    /// Framed lines of a compressed body whose zlib stream has not ended yet.
    held: Option<Vec<String>>,
    parser: ResponseParser,
}

impl ResponsePipeline {
    pub fn new(shape: ResponseShape) -> Self {
        let mode = match shape {
            ResponseShape::SingleLine => ResponseMode::SingleLine,
            ResponseShape::MultiLine | ResponseShape::CompressedMultiLine => {
                ResponseMode::MultiLine
            }
        };
        Self {
            stage: Stage::AwaitStatus,
            splitter: StatusLineSplitter::new(),
            decompressor: (shape == ResponseShape::CompressedMultiLine).then(Decompressor::new),
            framer: MultilineFramer::new(),
            held: None,
            parser: ResponseParser::new(mode),
        }
    }

    /// Feeds one chunk of inbound bytes.
    ///
    /// Returns `Ok(None)` until the response is complete. Bytes pushed after
    /// completion belong to no command and are discarded.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Option<Response>, NntpError> {
        match self.stage {
            Stage::Complete => {
                if !chunk.is_empty() {
                    tracing::warn!("discarding {} unsolicited bytes", chunk.len());
                }
                Ok(None)
            }
            Stage::AwaitStatus => {
                let Some((line, rest)) = self.splitter.push(chunk) else {
                    return Ok(None);
                };
                tracing::debug!("< {line}");
                match self.parser.status_line(&line)? {
                    Some(response) => {
                        self.stage = Stage::Complete;
                        if !rest.is_empty() {
                            tracing::warn!(
                                "discarding {} bytes after single-line response",
                                rest.len()
                            );
                        }
                        Ok(Some(response))
                    }
                    None => {
                        self.stage = Stage::AwaitBody;
                        self.push_body(&rest)
                    }
                }
            }
            Stage::AwaitBody => self.push_body(chunk),
        }
    }

    fn push_body(&mut self, chunk: &[u8]) -> Result<Option<Response>, NntpError> {
        let Some(decompressor) = self.decompressor.as_mut() else {
            return match self.framer.push(chunk) {
                Some(lines) => self.complete(lines).map(Some),
                None => Ok(None),
            };
        };

        // The terminator can surface before the zlib trailer is read; the
        // response completes only once the stream has ended.
        let inflated = decompressor.push(chunk)?;
        let finished = decompressor.is_finished();
        if let Some(lines) = self.framer.push(&inflated) {
            self.held = Some(lines);
        }
        match (self.held.take(), finished) {
            (Some(lines), true) => self.complete(lines).map(Some),
            (None, true) => Err(NntpError::Parse(
                "compressed body ended without terminator".into(),
            )),
            (held, false) => {
                self.held = held;
                Ok(None)
            }
        }
    }

    fn complete(&mut self, lines: Vec<String>) -> Result<Response, NntpError> {
        self.stage = Stage::Complete;
        tracing::debug!("< {} body lines", lines.len());
        self.parser.body(lines)
    }
}
