use n2kascii_transport::ByteSource;
use tracing::{trace, warn};

/// Default bound on one accumulated line.
pub const DEFAULT_LINE_CAPACITY: usize = 300;

/// Byte that ends a line on the wire.
pub const LINE_TERMINATOR: u8 = b'\n';

/// Bounded buffer holding the bytes of one line.
///
/// Bytes past the capacity are dropped without error. The buffer remembers
/// that it overflowed so callers can report the truncation.
#[derive(Debug, Clone)]
pub struct LineBuffer {
    bytes: Vec<u8>,
    capacity: usize,
    overflowed: bool,
}

impl LineBuffer {
    /// Create an empty buffer bounded to `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
            capacity,
            overflowed: false,
        }
    }

    /// Append one byte. Returns `false` if the buffer is full and the byte was dropped.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.bytes.len() >= self.capacity {
            self.overflowed = true;
            return false;
        }
        self.bytes.push(byte);
        true
    }

    /// Empty the buffer for the next line.
    pub fn reset(&mut self) {
        self.bytes.clear();
        self.overflowed = false;
    }

    /// Accumulated bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Maximum number of bytes kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether bytes were dropped since the last reset.
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_LINE_CAPACITY)
    }
}

/// Assembles terminator-delimited lines from a non-blocking byte source.
#[derive(Debug, Clone, Default)]
pub struct LineAccumulator {
    buf: LineBuffer,
}

impl LineAccumulator {
    /// Create an accumulator whose lines are bounded to `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: LineBuffer::with_capacity(capacity),
        }
    }

    /// Read one line from `source`.
    ///
    /// Consumes bytes until `terminator` is seen or the source has nothing
    /// more to give right now. The terminator itself is not stored. Returns
    /// `None` when nothing was accumulated, which is the normal outcome of
    /// polling an idle source.
    pub fn read_line<S>(&mut self, source: &mut S, terminator: u8) -> Option<&[u8]>
    where
        S: ByteSource + ?Sized,
    {
        self.buf.reset();

        while let Some(byte) = source.read_one() {
            if byte == terminator {
                break;
            }
            self.buf.push(byte);
        }

        if self.buf.is_empty() {
            return None;
        }

        if self.buf.overflowed() {
            warn!(
                capacity = self.buf.capacity(),
                "line exceeded buffer capacity, tail dropped"
            );
        }
        trace!(len = self.buf.len(), "accumulated line");
        Some(self.buf.as_bytes())
    }

    /// The buffer holding the most recent line.
    pub fn buffer(&self) -> &LineBuffer {
        &self.buf
    }

    /// Reset the buffer without reading.
    pub fn reset(&mut self) {
        self.buf.reset();
    }
}
