use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::TextStream;

/// Non-blocking TCP listener for text clients.
///
/// `try_accept` never blocks, so it can be polled from the same cooperative
/// loop that drives the message pump.
pub struct TcpServer {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpServer {
    /// Bind and listen on `addr`.
    pub fn bind(addr: impl ToSocketAddrs + std::fmt::Debug) -> Result<Self> {
        let label = format!("{addr:?}");
        let listener = TcpListener::bind(&addr).map_err(|e| TransportError::Bind {
            addr: label.clone(),
            source: e,
        })?;
        listener
            .set_nonblocking(true)
            .map_err(|e| TransportError::Bind {
                addr: label.clone(),
                source: e,
            })?;
        let local_addr = listener.local_addr().map_err(|e| TransportError::Bind {
            addr: label,
            source: e,
        })?;

        info!(%local_addr, "listening for text clients");

        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Accept a pending connection, if any.
    ///
    /// The returned stream is switched to non-blocking mode.
    pub fn try_accept(&self) -> Result<Option<(TextStream<TcpStream>, SocketAddr)>> {
        match self.listener.accept() {
            Ok((stream, peer)) => {
                stream
                    .set_nonblocking(true)
                    .map_err(TransportError::Accept)?;
                stream.set_nodelay(true).map_err(TransportError::Accept)?;
                debug!(%peer, "accepted text client");
                Ok(Some((TextStream::new(stream), peer)))
            }
            Err(err) if err.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(err) => Err(TransportError::Accept(err)),
        }
    }

    /// The address this server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

/// Connect to a listening text server (blocking connect, blocking stream).
pub fn connect(addr: impl ToSocketAddrs + std::fmt::Debug) -> Result<TextStream<TcpStream>> {
    let label = format!("{addr:?}");
    let stream = TcpStream::connect(&addr).map_err(|e| TransportError::Connect {
        addr: label,
        source: e,
    })?;
    debug!(peer = ?stream.peer_addr().ok(), "connected to text server");
    Ok(TextStream::new(stream))
}
