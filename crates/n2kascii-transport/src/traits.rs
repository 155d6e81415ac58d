use std::collections::VecDeque;

use crate::error::Result;

/// Line terminator appended by sinks after every written line.
pub const LINE_ENDING: &[u8] = b"\r\n";

/// A non-blocking source of bytes.
///
/// Implementations must never block: when nothing is buffered and nothing
/// can be read right now, `read_one` returns `None` and the caller tries
/// again on its next scheduling tick.
pub trait ByteSource {
    /// Whether at least one byte can be read without blocking.
    fn available(&mut self) -> bool;

    /// Read one byte, or `None` if no data is available right now.
    fn read_one(&mut self) -> Option<u8>;

    /// Whether the remote end has gone away. A closed source still yields
    /// any bytes it buffered before closing.
    fn is_closed(&self) -> bool {
        false
    }
}

/// A sink accepting complete text lines.
pub trait ByteSink {
    /// Write `line` followed by [`LINE_ENDING`].
    fn write_line(&mut self, line: &str) -> Result<()>;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn available(&mut self) -> bool {
        (**self).available()
    }

    fn read_one(&mut self) -> Option<u8> {
        (**self).read_one()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn available(&mut self) -> bool {
        (**self).available()
    }

    fn read_one(&mut self) -> Option<u8> {
        (**self).read_one()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

/// In-memory source, mostly useful for tests and replaying captured traffic.
impl ByteSource for VecDeque<u8> {
    fn available(&mut self) -> bool {
        !self.is_empty()
    }

    fn read_one(&mut self) -> Option<u8> {
        self.pop_front()
    }
}

impl<S: ByteSink + ?Sized> ByteSink for &mut S {
    fn write_line(&mut self, line: &str) -> Result<()> {
        (**self).write_line(line)
    }
}

impl ByteSink for Vec<u8> {
    fn write_line(&mut self, line: &str) -> Result<()> {
        self.extend_from_slice(line.as_bytes());
        self.extend_from_slice(LINE_ENDING);
        Ok(())
    }
}
