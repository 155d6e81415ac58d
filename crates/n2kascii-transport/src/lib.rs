//! Byte-oriented transport abstraction for Actisense ASCII links.
//!
//! The codec never touches sockets directly. It pulls bytes from a
//! [`ByteSource`] and pushes finished lines into a [`ByteSink`]:
//! - [`TextStream`] adapts any `Read + Write` stream (TCP, serial device)
//! - [`TcpServer`] accepts text clients without blocking the caller
//!
//! This is the lowest layer of n2kascii. Everything else builds on top of
//! the traits provided here.

pub mod error;
pub mod stream;
pub mod tcp;
pub mod traits;

pub use error::{Result, TransportError};
pub use stream::{TextStream, MAX_PENDING_OUTPUT};
pub use tcp::{connect, TcpServer};
pub use traits::{ByteSink, ByteSource};
