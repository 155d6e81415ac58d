use bytes::Bytes;

use crate::error::{CodecError, Result};

/// Maximum payload carried by one network message (fast-packet limit).
pub const MAX_PAYLOAD_LEN: usize = 223;

/// Largest PGN the 5-digit hex field holds.
pub const MAX_PGN: u32 = 0xF_FFFF;

/// Destination address meaning "every node".
pub const BROADCAST: u8 = 0xFF;

/// Highest (least urgent) message priority.
pub const MAX_PRIORITY: u8 = 7;

/// One decoded or encodable network message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireMessage {
    /// Parameter Group Number.
    pub pgn: u32,
    /// Originating node address.
    pub source: u8,
    /// Target node address, [`BROADCAST`] for everyone.
    pub destination: u8,
    /// Priority, 0 (highest) to 7.
    pub priority: u8,
    /// Raw timestamp text as seen on the wire. Not interpreted.
    pub timestamp: Option<String>,
    /// Message data, at most [`MAX_PAYLOAD_LEN`] bytes.
    pub payload: Bytes,
}

impl WireMessage {
    /// Create a message, rejecting a PGN above [`MAX_PGN`] and payloads above
    /// [`MAX_PAYLOAD_LEN`].
    pub fn new(
        pgn: u32,
        source: u8,
        destination: u8,
        priority: u8,
        payload: impl Into<Bytes>,
    ) -> Result<Self> {
        if pgn > MAX_PGN {
            return Err(CodecError::PgnOutOfRange { pgn, max: MAX_PGN });
        }
        let payload = payload.into();
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(CodecError::PayloadTooLong {
                max: MAX_PAYLOAD_LEN,
            });
        }
        Ok(Self {
            pgn,
            source,
            destination,
            priority: priority & MAX_PRIORITY,
            timestamp: None,
            payload,
        })
    }

    /// Whether the message is addressed to every node.
    pub fn is_broadcast(&self) -> bool {
        self.destination == BROADCAST
    }

    /// Number of payload bytes.
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Equality ignoring the timestamp, which the text format does not preserve.
    pub fn same_content(&self, other: &Self) -> bool {
        self.pgn == other.pgn
            && self.source == other.source
            && self.destination == other.destination
            && self.priority == other.priority
            && self.payload == other.payload
    }
}
