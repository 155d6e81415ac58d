/// Errors that can occur during line decoding/encoding.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The line does not begin with the `A` start marker.
    #[error("invalid start marker 0x{found:02x} (expected 'A')")]
    InvalidStart { found: u8 },

    /// The line is shorter than the fixed header.
    #[error("line too short ({len} chars, min {min})")]
    TooShort { len: usize, min: usize },

    /// The payload holds more bytes than a network message can carry.
    #[error("payload too long (max {max} bytes)")]
    PayloadTooLong { max: usize },

    /// The PGN does not fit the 5-digit field.
    #[error("pgn 0x{pgn:X} out of range (max 0x{max:X})")]
    PgnOutOfRange { pgn: u32, max: u32 },

    /// The encoded line does not fit the caller's buffer.
    #[error("encoded line needs {required} bytes, capacity is {capacity}")]
    OverflowOnEncode { required: usize, capacity: usize },

    /// Writing an encoded line to the sink failed.
    #[error("line transport error: {0}")]
    Transport(#[from] n2kascii_transport::TransportError),

    /// An I/O error occurred while framing lines from an async stream.
    #[error("line I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    /// Whether this error only concerns one line and the stream may carry on.
    pub fn is_line_local(&self) -> bool {
        !matches!(self, CodecError::Transport(_) | CodecError::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;
