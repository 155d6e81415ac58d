use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::time::{Duration, Instant};

use n2kascii_codec::{LineWriter, MessagePump, PumpStats, WireMessage};
use n2kascii_transport::{Result as TransportResult, TcpServer, TextStream, TransportError};
use tracing::{debug, info, warn};

use crate::bus::{BusSender, GatewayCounters};
use crate::config::GatewayConfig;
use crate::error::Result;

/// Bridges one text client at a time to the bus.
///
/// Client to bus: the client's stream is attached to a [`MessagePump`] whose
/// handler hands each decoded message to the [`BusSender`]. Bus to client:
/// the owner calls [`forward`](Self::forward) for every message seen on the
/// bus. Call [`poll`](Self::poll) at the configured pump interval.
pub struct Gateway {
    server: TcpServer,
    pump: MessagePump<TextStream<TcpStream>>,
    writer: Option<LineWriter<TextStream<TcpStream>>>,
    peer: Option<SocketAddr>,
    counters: Arc<GatewayCounters>,
    config: GatewayConfig,
    last_accept: Option<Instant>,
}

impl Gateway {
    /// Bind the text server and wire the pump's handler to `bus`.
    pub fn bind(config: GatewayConfig, bus: impl BusSender + 'static) -> Result<Self> {
        config.validate()?;
        let server = TcpServer::bind(config.bind.as_str())?;

        let counters = Arc::new(GatewayCounters::default());
        let mut pump = MessagePump::with_config(config.pump_config());
        let mut bus = bus;
        let handler_counters = Arc::clone(&counters);
        pump.set_handler(move |message: &WireMessage| match bus.send(message) {
            Ok(()) => handler_counters.record_from_client(),
            Err(err) => {
                handler_counters.record_bus_error();
                warn!(pgn = message.pgn, error = %err, "bus send failed");
            }
        });

        info!(
            local_addr = %server.local_addr(),
            default_source = config.default_source,
            "gateway ready"
        );

        Ok(Self {
            server,
            pump,
            writer: None,
            peer: None,
            counters,
            config,
            last_accept: None,
        })
    }

    /// Accept a waiting client if none is connected and the accept interval
    /// has passed. Returns the new client's address.
    ///
    /// A connection that fails during accept is logged and skipped.
    pub fn poll_accept(&mut self) -> Result<Option<SocketAddr>> {
        if self.peer.is_some() {
            return Ok(None);
        }
        let now = Instant::now();
        if let Some(last) = self.last_accept {
            if now.duration_since(last) < self.config.accept_interval() {
                return Ok(None);
            }
        }
        self.last_accept = Some(now);

        let Some((stream, peer)) = skip_failed_accept(self.server.try_accept())? else {
            return Ok(None);
        };
        let writer_stream = match stream.get_ref().try_clone() {
            Ok(clone) => TextStream::new(clone),
            Err(err) => {
                warn!(%peer, error = %err, "cannot split text client stream");
                return Ok(None);
            }
        };
        self.writer = Some(LineWriter::with_capacity(
            writer_stream,
            self.config.encode_capacity,
        ));
        self.pump.attach_source(stream);
        self.peer = Some(peer);

        let client = self.counters.record_client();
        info!(%peer, client, "text client connected");
        Ok(Some(peer))
    }

    /// Drain the client's pending lines to the bus.
    ///
    /// Drops the client once its stream reports closed.
    pub fn pump_once(&mut self) -> usize {
        let decoded = self.pump.pump_once();
        if self.pump.source_closed() {
            debug!("text client stream closed");
            self.disconnect();
        }
        decoded
    }

    /// Send a bus message to the connected client.
    ///
    /// Returns `Ok(false)` when no client is connected. A write failure
    /// drops the client and is not an error.
    pub fn forward(&mut self, message: &WireMessage) -> Result<bool> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(false);
        };
        match writer.send(message) {
            Ok(()) => {
                self.counters.record_from_bus();
                Ok(true)
            }
            Err(err) if err.is_line_local() => Err(err.into()),
            Err(err) => {
                warn!(error = %err, "write to text client failed");
                self.disconnect();
                Ok(false)
            }
        }
    }

    /// Push bus lines still queued for the client. A write failure drops
    /// the client.
    pub fn flush_client(&mut self) {
        let Some(writer) = self.writer.as_mut() else {
            return;
        };
        if let Err(err) = writer.get_mut().flush_pending() {
            warn!(error = %err, "flush to text client failed");
            self.disconnect();
        }
    }

    /// One scheduler tick: accept if idle, flush queued output, then pump.
    pub fn poll(&mut self) -> Result<usize> {
        self.poll_accept()?;
        self.flush_client();
        Ok(self.pump_once())
    }

    /// Drop the current client, if any.
    pub fn disconnect(&mut self) {
        self.pump.detach_source();
        self.writer = None;
        if let Some(peer) = self.peer.take() {
            info!(%peer, "text client disconnected");
        }
    }

    /// Address of the connected client.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Address the text server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.server.local_addr()
    }

    pub fn counters(&self) -> Arc<GatewayCounters> {
        Arc::clone(&self.counters)
    }

    pub fn pump_stats(&self) -> PumpStats {
        self.pump.stats()
    }

    pub fn pump_interval(&self) -> Duration {
        self.config.pump_interval()
    }
}

fn skip_failed_accept<T>(accepted: TransportResult<Option<T>>) -> Result<Option<T>> {
    match accepted {
        Ok(accepted) => Ok(accepted),
        Err(TransportError::Accept(err)) => {
            warn!(error = %err, "accept failed, waiting for next client");
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("local_addr", &self.server.local_addr())
            .field("peer", &self.peer)
            .field("pump", &self.pump)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, BufRead, BufReader, Write};
    use std::sync::Mutex;
    use std::thread;

    use super::*;
    use crate::error::GatewayError;

    type Sent = Arc<Mutex<Vec<WireMessage>>>;

    fn test_config() -> GatewayConfig {
        GatewayConfig {
            bind: "127.0.0.1:0".to_string(),
            accept_interval_ms: 0,
            ..GatewayConfig::default()
        }
    }

    fn recording_gateway() -> (Gateway, Sent) {
        let sent: Sent = Arc::default();
        let sink = Arc::clone(&sent);
        let gateway = Gateway::bind(test_config(), move |msg: &WireMessage| -> Result<()> {
            sink.lock().unwrap().push(msg.clone());
            Ok(())
        })
        .unwrap();
        (gateway, sent)
    }

    fn poll_until(gateway: &mut Gateway, mut done: impl FnMut(&Gateway) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done(gateway) {
            assert!(Instant::now() < deadline, "timed out polling gateway");
            gateway.poll().unwrap();
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn client_lines_reach_bus() {
        let (mut gateway, sent) = recording_gateway();
        let addr = gateway.local_addr();

        let mut client = TcpStream::connect(addr).unwrap();
        poll_until(&mut gateway, |g| g.peer_addr().is_some());

        client
            .write_all(b"A000000.000 0AFF2 1F112 0102\r\nnot a line\r\n")
            .unwrap();
        poll_until(&mut gateway, |_| !sent.lock().unwrap().is_empty());

        let sent = sent.lock().unwrap();
        assert_eq!(sent[0].pgn, 0x1F112);
        assert_eq!(sent[0].source, 0x0A);
        assert_eq!(sent[0].destination, 0xFF);
        assert_eq!(sent[0].priority, 2);
        assert_eq!(&sent[0].payload[..], &[0x01, 0x02]);
        assert_eq!(gateway.counters().from_client(), 1);
    }

    #[test]
    fn bus_messages_reach_client() {
        let (mut gateway, _sent) = recording_gateway();
        let addr = gateway.local_addr();

        let client = TcpStream::connect(addr).unwrap();
        poll_until(&mut gateway, |g| g.peer_addr().is_some());

        let msg = WireMessage::new(130306, 0x23, 0xFF, 2, vec![0xAB, 0xCD]).unwrap();
        assert!(gateway.forward(&msg).unwrap());

        let mut reader = BufReader::new(client);
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        assert_eq!(line, "A000000.000 23FF2 1FD02 ABCD\r\n");
        assert_eq!(gateway.counters().from_bus(), 1);
    }

    #[test]
    fn forward_without_client_is_noop() {
        let (mut gateway, _sent) = recording_gateway();
        let msg = WireMessage::new(60928, 1, 0xFF, 6, vec![0; 8]).unwrap();
        assert!(!gateway.forward(&msg).unwrap());
        assert_eq!(gateway.counters().from_bus(), 0);
    }

    #[test]
    fn write_failure_drops_client() {
        let (mut gateway, _sent) = recording_gateway();
        let client = TcpStream::connect(gateway.local_addr()).unwrap();
        poll_until(&mut gateway, |g| g.peer_addr().is_some());
        drop(client);

        // The first writes land in the kernel buffer before the reset arrives.
        let msg = WireMessage::new(130306, 0x23, 0xFF, 2, vec![0xAB; 64]).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut delivered = 0;
        while gateway.forward(&msg).unwrap() {
            delivered += 1;
            assert!(Instant::now() < deadline, "write to closed client never failed");
            thread::sleep(Duration::from_millis(5));
        }

        assert!(gateway.peer_addr().is_none());
        assert_eq!(gateway.counters().from_bus(), delivered);
        assert!(!gateway.forward(&msg).unwrap());
    }

    #[test]
    fn failed_accept_is_skipped() {
        let failed: TransportResult<Option<()>> = Err(TransportError::Accept(io::Error::from(
            io::ErrorKind::ConnectionAborted,
        )));
        assert!(skip_failed_accept(failed).unwrap().is_none());

        let closed: TransportResult<Option<()>> = Err(TransportError::Closed);
        assert!(matches!(
            skip_failed_accept(closed),
            Err(GatewayError::Transport(TransportError::Closed))
        ));
    }

    #[test]
    fn closed_client_is_dropped_and_next_accepted() {
        let (mut gateway, _sent) = recording_gateway();
        let addr = gateway.local_addr();

        let first = TcpStream::connect(addr).unwrap();
        poll_until(&mut gateway, |g| g.peer_addr().is_some());
        drop(first);
        poll_until(&mut gateway, |g| g.peer_addr().is_none());

        let _second = TcpStream::connect(addr).unwrap();
        poll_until(&mut gateway, |g| g.peer_addr().is_some());
        assert_eq!(gateway.counters().clients(), 2);
    }

    #[test]
    fn bus_failures_are_counted() {
        let mut gateway = Gateway::bind(test_config(), |_: &WireMessage| -> Result<()> {
            Err(GatewayError::Bus("no transceiver".into()))
        })
        .unwrap();
        let addr = gateway.local_addr();

        let mut client = TcpStream::connect(addr).unwrap();
        poll_until(&mut gateway, |g| g.peer_addr().is_some());
        client.write_all(b"A000000.000 0AFF2 1F112 01\n").unwrap();
        poll_until(&mut gateway, |g| g.counters().bus_errors() > 0);

        assert_eq!(gateway.counters().from_client(), 0);
        assert_eq!(gateway.pump_stats().decoded, 1);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = GatewayConfig {
            line_capacity: 0,
            ..test_config()
        };
        let err = Gateway::bind(config, |_: &WireMessage| -> Result<()> { Ok(()) }).unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
    }
}
