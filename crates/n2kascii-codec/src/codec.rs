use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::{trace, warn};

use crate::error::{CodecError, Result};
use crate::message::{WireMessage, MAX_PAYLOAD_LEN, MAX_PGN, MAX_PRIORITY};

/// First character of every data line.
pub const START_MARKER: u8 = b'A';

/// Length of the fixed header: marker, timestamp, address block and PGN.
pub const MIN_LINE_LEN: usize = 24;

/// Width of the timestamp field.
pub const TIMESTAMP_LEN: usize = 10;

/// Timestamp written on every encoded line. Receivers ignore the field.
pub const TIMESTAMP_PLACEHOLDER: &str = "000000.000";

/// Buffer size that fits any valid message plus the sentinel.
pub const DEFAULT_ENCODE_CAPACITY: usize = 512;

// Field offsets, see the layout on [`encode`].
const TIMESTAMP: std::ops::Range<usize> = 1..11;
const SOURCE: std::ops::Range<usize> = 12..14;
const DESTINATION: std::ops::Range<usize> = 14..16;
const PRIORITY: std::ops::Range<usize> = 16..17;
const PGN: std::ops::Range<usize> = 18..23;
const PAYLOAD_START: usize = 24;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Knobs for [`decode_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Maximum number of payload bytes accepted. Default: 223.
    pub max_payload_len: usize,
    /// Address used when the source field is not valid hex.
    /// `None` keeps the zero fallback used for every other field.
    pub source_fallback: Option<u8>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_payload_len: MAX_PAYLOAD_LEN,
            source_fallback: None,
        }
    }
}

/// Decode one line with default options.
///
/// The line must not contain the `\n` terminator; a trailing `\r` is
/// tolerated by the payload parser.
pub fn decode(line: &[u8]) -> Result<WireMessage> {
    decode_with(line, &DecodeOptions::default())
}

/// Decode one line held in a string.
pub fn decode_str(line: &str) -> Result<WireMessage> {
    decode(line.as_bytes())
}

/// Decode one line.
///
/// Fields sit at fixed offsets. Hex is case-insensitive and a field holding
/// anything other than hex digits reads as zero. The payload is read in
/// pairs from offset 24; a pair that is shorter than two characters once
/// whitespace is trimmed is dropped.
pub fn decode_with(line: &[u8], options: &DecodeOptions) -> Result<WireMessage> {
    let Some(&first) = line.first() else {
        return Err(CodecError::TooShort {
            len: 0,
            min: MIN_LINE_LEN,
        });
    };
    if first != START_MARKER {
        return Err(CodecError::InvalidStart { found: first });
    }
    if line.len() < MIN_LINE_LEN {
        return Err(CodecError::TooShort {
            len: line.len(),
            min: MIN_LINE_LEN,
        });
    }

    let timestamp = String::from_utf8_lossy(&line[TIMESTAMP]).into_owned();
    let source = match parse_hex(&line[SOURCE]) {
        Some(value) => value as u8,
        None => {
            let fallback = options.source_fallback.unwrap_or(0);
            trace!(fallback, "source field is not hex");
            fallback
        }
    };
    let destination = hex_or_zero("destination", &line[DESTINATION]) as u8;
    let priority = hex_or_zero("priority", &line[PRIORITY]) as u8 & MAX_PRIORITY;
    let pgn = hex_or_zero("pgn", &line[PGN]);

    let payload_chars = line.len() - PAYLOAD_START;
    let mut payload = Vec::with_capacity((payload_chars / 2).min(options.max_payload_len));
    for group in line[PAYLOAD_START..].chunks(2) {
        let group = group.trim_ascii();
        if group.len() < 2 {
            trace!(dropped = group.len(), "dropping short payload group");
            continue;
        }
        if payload.len() >= options.max_payload_len {
            return Err(CodecError::PayloadTooLong {
                max: options.max_payload_len,
            });
        }
        payload.push(hex_or_zero("payload", group) as u8);
    }

    trace!(pgn, source, destination, priority, len = payload.len(), "decoded line");

    Ok(WireMessage {
        pgn,
        source,
        destination,
        priority,
        timestamp: Some(timestamp),
        payload: Bytes::from(payload),
    })
}

fn parse_hex(field: &[u8]) -> Option<u32> {
    if field.is_empty() {
        return None;
    }
    field
        .iter()
        .try_fold(0u32, |acc, &b| Some((acc << 4) | char::from(b).to_digit(16)?))
}

fn hex_or_zero(name: &'static str, field: &[u8]) -> u32 {
    parse_hex(field).unwrap_or_else(|| {
        trace!(field = name, "field is not hex, reading as zero");
        0
    })
}

/// One encoded line, without the line terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedLine {
    line: String,
}

impl EncodedLine {
    pub fn as_str(&self) -> &str {
        &self.line
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.line.as_bytes()
    }

    /// Length in bytes, excluding the sentinel.
    pub fn len(&self) -> usize {
        self.line.len()
    }

    pub fn is_empty(&self) -> bool {
        self.line.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        Bytes::from(self.line.into_bytes())
    }
}

impl AsRef<str> for EncodedLine {
    fn as_ref(&self) -> &str {
        &self.line
    }
}

impl fmt::Display for EncodedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line)
    }
}

/// Encode a message into the wire layout.
///
/// ```text
/// ┌───┬────────────┬───┬────┬────┬───┬───┬───────┬───┬──────────────┐
/// │ A │ 000000.000 │ ␠ │ SS │ DD │ P │ ␠ │ PPPPP │ ␠ │ payload hex  │
/// └───┴────────────┴───┴────┴────┴───┴───┴───────┴───┴──────────────┘
/// ```
///
/// `capacity` is the size of the caller's buffer including a one-byte
/// sentinel. A line that would not fit is rejected with
/// [`CodecError::OverflowOnEncode`] and nothing is produced.
pub fn encode(message: &WireMessage, capacity: usize) -> Result<EncodedLine> {
    if message.payload.len() > MAX_PAYLOAD_LEN {
        return Err(CodecError::PayloadTooLong {
            max: MAX_PAYLOAD_LEN,
        });
    }
    if message.pgn > MAX_PGN {
        return Err(CodecError::PgnOutOfRange {
            pgn: message.pgn,
            max: MAX_PGN,
        });
    }

    let len = MIN_LINE_LEN + 2 * message.payload.len();
    let required = len + 1;
    if required > capacity {
        warn!(
            pgn = message.pgn,
            required, capacity, "encoded line does not fit buffer"
        );
        return Err(CodecError::OverflowOnEncode { required, capacity });
    }

    let mut line = String::with_capacity(len);
    line.push(char::from(START_MARKER));
    line.push_str(TIMESTAMP_PLACEHOLDER);
    line.push(' ');
    push_hex(&mut line, u32::from(message.source), 2);
    push_hex(&mut line, u32::from(message.destination), 2);
    push_hex(&mut line, u32::from(message.priority & MAX_PRIORITY), 1);
    line.push(' ');
    push_hex(&mut line, message.pgn, 5);
    line.push(' ');
    for &byte in message.payload.iter() {
        push_hex(&mut line, u32::from(byte), 2);
    }

    Ok(EncodedLine { line })
}

/// Append the encoded line (no terminator) to `dst`.
pub fn encode_into(message: &WireMessage, dst: &mut BytesMut) -> Result<()> {
    let line = encode(message, usize::MAX)?;
    dst.put_slice(line.as_bytes());
    Ok(())
}

fn push_hex(out: &mut String, value: u32, digits: u32) {
    for shift in (0..digits).rev() {
        let nibble = (value >> (shift * 4)) & 0xF;
        out.push(char::from(HEX_DIGITS[nibble as usize]));
    }
}
