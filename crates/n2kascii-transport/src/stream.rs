use std::io::{ErrorKind, Read, Write};

use bytes::{Buf, BytesMut};
use tracing::{debug, warn};

use crate::error::{Result, TransportError};
use crate::traits::{ByteSink, ByteSource, LINE_ENDING};

const READ_CHUNK_SIZE: usize = 512;

/// Bound on output queued for a peer that is not reading.
pub const MAX_PENDING_OUTPUT: usize = 64 * 1024;

/// Adapts a `Read + Write` stream to [`ByteSource`] and [`ByteSink`].
///
/// Reads are done in chunks into an internal buffer and handed out one byte
/// at a time. The inner stream should be in non-blocking mode; `WouldBlock`
/// is treated as "no data right now". EOF and hard I/O errors mark the
/// stream closed.
///
/// Writes never wait. Output the stream does not take right away is queued
/// and retried by [`flush_pending`](Self::flush_pending) or the next
/// `write_line`. A line that would push the queue past
/// [`MAX_PENDING_OUTPUT`] is refused with [`TransportError::Stalled`].
pub struct TextStream<T> {
    inner: T,
    buf: BytesMut,
    out: BytesMut,
    closed: bool,
}

impl<T> TextStream<T> {
    /// Wrap a stream.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(READ_CHUNK_SIZE),
            out: BytesMut::new(),
            closed: false,
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the adapter and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Number of bytes read from the stream but not yet consumed.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Number of bytes queued for writing.
    pub fn pending(&self) -> usize {
        self.out.len()
    }

    /// Whether the remote end has gone, seen from either direction.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl<T: Read> TextStream<T> {
    /// Pull whatever the stream has ready into the internal buffer.
    fn fill(&mut self) {
        if self.closed {
            return;
        }

        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            match self.inner.read(&mut chunk) {
                Ok(0) => {
                    debug!("text stream reached end of input");
                    self.closed = true;
                    return;
                }
                Ok(n) => {
                    self.buf.extend_from_slice(&chunk[..n]);
                    return;
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => return,
                Err(err) => {
                    warn!(error = %err, "text stream read failed, closing");
                    self.closed = true;
                    return;
                }
            }
        }
    }
}

impl<T: Read> ByteSource for TextStream<T> {
    fn available(&mut self) -> bool {
        if self.buf.is_empty() {
            self.fill();
        }
        !self.buf.is_empty()
    }

    fn read_one(&mut self) -> Option<u8> {
        if !self.available() {
            return None;
        }
        Some(self.buf.get_u8())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

impl<T: Write> TextStream<T> {
    /// Write as much queued output as the stream takes without blocking.
    pub fn flush_pending(&mut self) -> Result<()> {
        while !self.out.is_empty() {
            match self.inner.write(&self.out) {
                Ok(0) => {
                    self.closed = true;
                    return Err(TransportError::Closed);
                }
                Ok(n) => self.out.advance(n),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => return Ok(()),
                Err(err) => return Err(TransportError::Io(err)),
            }
        }

        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => return Ok(()),
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl<T: Write> ByteSink for TextStream<T> {
    fn write_line(&mut self, line: &str) -> Result<()> {
        let pending = self.out.len();
        if pending + line.len() + LINE_ENDING.len() > MAX_PENDING_OUTPUT {
            warn!(pending, "peer not reading, refusing line");
            return Err(TransportError::Stalled { pending });
        }

        self.out.extend_from_slice(line.as_bytes());
        self.out.extend_from_slice(LINE_ENDING);
        self.flush_pending()
    }
}

impl<T> std::fmt::Debug for TextStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextStream")
            .field("buffered", &self.buf.len())
            .field("pending", &self.out.len())
            .field("closed", &self.closed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn reads_bytes_then_reports_closed() {
        let mut stream = TextStream::new(Cursor::new(b"AB".to_vec()));

        assert_eq!(stream.read_one(), Some(b'A'));
        assert_eq!(stream.read_one(), Some(b'B'));
        assert!(!stream.is_closed());
        assert_eq!(stream.read_one(), None);
        assert!(stream.is_closed());
    }

    #[test]
    fn would_block_is_not_closed() {
        let mut stream = TextStream::new(WouldBlockThenData {
            state: 0,
            bytes: b"x".to_vec(),
            pos: 0,
        });

        assert!(!stream.available());
        assert!(!stream.is_closed());
        assert_eq!(stream.read_one(), Some(b'x'));
    }

    #[test]
    fn interrupted_read_retries() {
        let mut stream = TextStream::new(InterruptedThenData {
            state: 0,
            bytes: b"ok".to_vec(),
            pos: 0,
        });

        assert_eq!(stream.read_one(), Some(b'o'));
        assert_eq!(stream.buffered(), 1);
    }

    #[test]
    fn hard_error_closes_stream() {
        let mut stream = TextStream::new(FailingReader);

        assert_eq!(stream.read_one(), None);
        assert!(stream.is_closed());
    }

    #[test]
    fn write_line_appends_crlf() {
        let mut stream = TextStream::new(Cursor::new(Vec::<u8>::new()));
        stream.write_line("A000000.000 23FF7 1F513 01").unwrap();

        let written = stream.into_inner().into_inner();
        assert_eq!(written, b"A000000.000 23FF7 1F513 01\r\n");
    }

    #[test]
    fn zero_length_write_reports_closed() {
        let mut stream = TextStream::new(ZeroWriter);
        let err = stream.write_line("A").unwrap_err();

        assert!(matches!(err, TransportError::Closed));
        assert!(stream.is_closed());
    }

    #[test]
    fn stalled_peer_queues_then_refuses() {
        let mut stream = TextStream::new(StalledWriter);
        let line = "A000000.000 23FF7 1F513 012F3070002F30709F";

        stream.write_line(line).unwrap();
        assert_eq!(stream.pending(), line.len() + 2);

        let mut accepted = 1usize;
        let err = loop {
            match stream.write_line(line) {
                Ok(()) => accepted += 1,
                Err(err) => break err,
            }
            assert!(accepted <= MAX_PENDING_OUTPUT, "queue never filled");
        };

        let queued = accepted * (line.len() + 2);
        assert!(matches!(err, TransportError::Stalled { pending } if pending == queued));
        assert!(stream.pending() <= MAX_PENDING_OUTPUT);
        assert!(!stream.is_closed());
    }

    #[test]
    fn queued_output_drains_when_peer_resumes() {
        let mut stream = TextStream::new(ResumingWriter {
            blocked: true,
            written: Vec::new(),
        });

        stream.write_line("first").unwrap();
        stream.write_line("second").unwrap();
        assert_eq!(stream.pending(), 15);

        stream.get_mut().blocked = false;
        stream.flush_pending().unwrap();
        assert_eq!(stream.pending(), 0);
        assert_eq!(stream.get_ref().written, b"first\r\nsecond\r\n");
    }

    #[test]
    #[cfg(unix)]
    fn roundtrip_over_unix_pair() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        right.set_nonblocking(true).unwrap();
        let mut writer = TextStream::new(left);
        let mut reader = TextStream::new(right);

        writer.write_line("hi").unwrap();

        let mut got = Vec::new();
        for _ in 0..1000 {
            if let Some(byte) = reader.read_one() {
                got.push(byte);
                if got.len() == 4 {
                    break;
                }
            }
        }
        assert_eq!(got, b"hi\r\n");
    }

    struct WouldBlockThenData {
        state: u8,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for WouldBlockThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.state == 0 {
                self.state = 1;
                return Err(std::io::Error::from(ErrorKind::WouldBlock));
            }
            if self.pos >= self.bytes.len() {
                return Ok(0);
            }
            let remaining = self.bytes.len() - self.pos;
            let n = remaining.min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    struct InterruptedThenData {
        state: u8,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.state == 0 {
                self.state = 1;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            if self.pos >= self.bytes.len() {
                return Ok(0);
            }
            let remaining = self.bytes.len() - self.pos;
            let n = remaining.min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::ConnectionReset))
        }
    }

    struct StalledWriter;

    impl Write for StalledWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::WouldBlock))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::from(ErrorKind::WouldBlock))
        }
    }

    struct ResumingWriter {
        blocked: bool,
        written: Vec<u8>,
    }

    impl Write for ResumingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.blocked {
                return Err(std::io::Error::from(ErrorKind::WouldBlock));
            }
            // short writes
            let n = buf.len().min(4);
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
