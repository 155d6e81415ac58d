//! `tokio_util` codec for Actisense ASCII lines.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::accumulator::{DEFAULT_LINE_CAPACITY, LINE_TERMINATOR};
use crate::codec::{decode_with, encode_into, DecodeOptions};
use crate::error::CodecError;
use crate::message::WireMessage;

/// Frames and decodes lines from an async byte stream.
///
/// Unlike the polled [`MessagePump`](crate::MessagePump), partial lines stay
/// buffered until their terminator arrives. Lines longer than the capacity
/// are discarded up to the next terminator. Decode failures are returned as
/// errors; `FramedRead` callers may log them and keep reading.
#[derive(Debug, Clone)]
pub struct AsciiLineCodec {
    options: DecodeOptions,
    max_line_len: usize,
    discarding: bool,
}

impl AsciiLineCodec {
    /// Create a codec with default limits.
    pub fn new() -> Self {
        Self::with_options(DecodeOptions::default(), DEFAULT_LINE_CAPACITY)
    }

    /// Create a codec with explicit decode options and line bound.
    pub fn with_options(options: DecodeOptions, max_line_len: usize) -> Self {
        Self {
            options,
            max_line_len,
            discarding: false,
        }
    }
}

impl Default for AsciiLineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for AsciiLineCodec {
    type Item = WireMessage;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<WireMessage>, CodecError> {
        loop {
            let Some(pos) = src.iter().position(|&b| b == LINE_TERMINATOR) else {
                if src.len() > self.max_line_len {
                    if !self.discarding {
                        warn!(
                            max = self.max_line_len,
                            "line exceeded maximum length, discarding"
                        );
                    }
                    self.discarding = true;
                    src.clear();
                }
                return Ok(None);
            };

            let line = src.split_to(pos);
            src.advance(1);

            if self.discarding {
                self.discarding = false;
                continue;
            }
            if line.trim_ascii().is_empty() {
                continue;
            }
            if line.len() > self.max_line_len {
                warn!(
                    len = line.len(),
                    max = self.max_line_len,
                    "line exceeded maximum length, skipping"
                );
                continue;
            }

            return decode_with(&line, &self.options).map(Some);
        }
    }
}

impl Encoder<&WireMessage> for AsciiLineCodec {
    type Error = CodecError;

    fn encode(&mut self, item: &WireMessage, dst: &mut BytesMut) -> Result<(), CodecError> {
        encode_into(item, dst)?;
        dst.put_slice(b"\r\n");
        Ok(())
    }
}
