use n2kascii_transport::ByteSink;
use tracing::trace;

use crate::codec::{encode, DEFAULT_ENCODE_CAPACITY};
use crate::error::Result;
use crate::message::WireMessage;

/// Writes encoded messages, one per line, to a [`ByteSink`].
pub struct LineWriter<T> {
    inner: T,
    capacity: usize,
    written: u64,
}

impl<T: ByteSink> LineWriter<T> {
    /// Create a line writer with the default encode capacity.
    pub fn new(inner: T) -> Self {
        Self::with_capacity(inner, DEFAULT_ENCODE_CAPACITY)
    }

    /// Create a line writer whose encoded lines must fit `capacity` bytes
    /// (sentinel included).
    pub fn with_capacity(inner: T, capacity: usize) -> Self {
        Self {
            inner,
            capacity,
            written: 0,
        }
    }

    /// Encode and send one message.
    ///
    /// Nothing is written if the message does not fit the capacity.
    pub fn send(&mut self, message: &WireMessage) -> Result<()> {
        let line = encode(message, self.capacity)?;
        self.inner.write_line(line.as_str())?;
        self.written += 1;
        trace!(pgn = message.pgn, len = line.len(), "wrote line");
        Ok(())
    }

    /// Number of lines written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Borrow the underlying sink.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying sink.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner sink.
    pub fn into_inner(self) -> T {
        self.inner
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
