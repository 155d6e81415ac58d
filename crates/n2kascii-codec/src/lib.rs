//! Actisense ASCII codec and message pump for NMEA 2000 gateways.
//!
//! This is the core of n2kascii. Every message on the text side is one line:
//!
//! ```text
//! A173321.107 23FF7 1F513 012F3070002F30709F
//! ```
//!
//! - `A` start marker, 10 characters of timestamp
//! - source, destination and priority as `SSDDP`
//! - the 5-digit hexadecimal PGN
//! - the payload as consecutive hex byte pairs
//!
//! [`MessagePump`] frames lines out of a non-blocking byte source, decodes
//! them and hands each [`WireMessage`] to a registered handler. [`encode`]
//! and [`LineWriter`] go the other way.

#[cfg(feature = "async")]
pub mod async_codec;
pub mod accumulator;
pub mod codec;
pub mod error;
pub mod message;
pub mod pgn;
pub mod pump;
pub mod writer;

pub use accumulator::{LineAccumulator, LineBuffer, DEFAULT_LINE_CAPACITY, LINE_TERMINATOR};
#[cfg(feature = "async")]
pub use async_codec::AsciiLineCodec;
pub use codec::{
    decode, decode_str, decode_with, encode, encode_into, DecodeOptions, EncodedLine,
    DEFAULT_ENCODE_CAPACITY, MIN_LINE_LEN, START_MARKER, TIMESTAMP_LEN, TIMESTAMP_PLACEHOLDER,
};
pub use error::{CodecError, Result};
pub use message::{WireMessage, BROADCAST, MAX_PAYLOAD_LEN, MAX_PGN, MAX_PRIORITY};
pub use pump::{
    MessageHandler, MessagePump, PumpConfig, PumpState, PumpStats, DEFAULT_SOURCE_ADDRESS,
};
pub use writer::LineWriter;
