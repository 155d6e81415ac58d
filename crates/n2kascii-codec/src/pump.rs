use n2kascii_transport::ByteSource;
use tracing::{debug, trace};

use crate::accumulator::{LineAccumulator, DEFAULT_LINE_CAPACITY, LINE_TERMINATOR};
use crate::codec::{decode_with, DecodeOptions};
use crate::message::{WireMessage, MAX_PAYLOAD_LEN};

/// Source address used when a line carries none. Matches common Actisense tooling.
pub const DEFAULT_SOURCE_ADDRESS: u8 = 65;

/// Receives every message the pump decodes.
///
/// Called synchronously on the pump's thread. A handler that blocks stalls
/// all further decoding.
pub trait MessageHandler {
    fn handle(&mut self, message: &WireMessage);
}

impl<F> MessageHandler for F
where
    F: FnMut(&WireMessage),
{
    fn handle(&mut self, message: &WireMessage) {
        self(message)
    }
}

/// Where the pump is in its read cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpState {
    /// No byte source attached.
    Detached,
    /// Source attached, no line in progress.
    Idle,
    /// Reading a line.
    Accumulating,
}

/// Counters kept across `pump_once` calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpStats {
    /// Non-empty lines read.
    pub lines: u64,
    /// Lines decoded and dispatched.
    pub decoded: u64,
    /// Lines the decoder rejected.
    pub rejected: u64,
    /// Lines that overflowed the line buffer.
    pub truncated: u64,
}

/// Configuration for the message pump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpConfig {
    /// Byte that ends a line. Default: `\n`.
    pub terminator: u8,
    /// Bound on one line, in bytes. Default: 300.
    pub line_capacity: usize,
    /// Maximum payload bytes per message. Default: 223.
    pub max_payload_len: usize,
    /// Source address substituted when the source field is not hex. Default: 65.
    pub default_source: u8,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            terminator: LINE_TERMINATOR,
            line_capacity: DEFAULT_LINE_CAPACITY,
            max_payload_len: MAX_PAYLOAD_LEN,
            default_source: DEFAULT_SOURCE_ADDRESS,
        }
    }
}

/// Drives the read, decode and dispatch cycle without blocking.
///
/// Meant to be called from a fixed-cadence scheduler. Each
/// [`pump_once`](Self::pump_once) drains every line the source has ready.
pub struct MessagePump<S> {
    source: Option<S>,
    handler: Option<Box<dyn MessageHandler>>,
    accumulator: LineAccumulator,
    config: PumpConfig,
    stats: PumpStats,
    state: PumpState,
}

impl<S: ByteSource> MessagePump<S> {
    /// Create a detached pump with default configuration.
    pub fn new() -> Self {
        Self::with_config(PumpConfig::default())
    }

    /// Create a detached pump with explicit configuration.
    pub fn with_config(config: PumpConfig) -> Self {
        Self {
            source: None,
            handler: None,
            accumulator: LineAccumulator::with_capacity(config.line_capacity),
            config,
            stats: PumpStats::default(),
            state: PumpState::Detached,
        }
    }

    /// Attach a byte source, returning the one it replaces.
    pub fn attach_source(&mut self, source: S) -> Option<S> {
        self.accumulator.reset();
        self.state = PumpState::Idle;
        self.source.replace(source)
    }

    /// Detach and return the current byte source.
    ///
    /// The next `pump_once` is a no-op.
    pub fn detach_source(&mut self) -> Option<S> {
        self.accumulator.reset();
        self.state = PumpState::Detached;
        self.source.take()
    }

    /// Whether a byte source is attached.
    pub fn is_attached(&self) -> bool {
        self.source.is_some()
    }

    /// Whether the attached source reports its remote end has gone.
    pub fn source_closed(&self) -> bool {
        self.source.as_ref().is_some_and(|s| s.is_closed())
    }

    /// Register the handler, replacing any previous one.
    pub fn set_handler(&mut self, handler: impl MessageHandler + 'static) {
        self.handler = Some(Box::new(handler));
    }

    /// Set the address used for lines whose source field is not hex.
    pub fn set_default_source_address(&mut self, address: u8) {
        self.config.default_source = address;
    }

    pub fn default_source_address(&self) -> u8 {
        self.config.default_source
    }

    /// Read, decode and dispatch every line currently available.
    ///
    /// Returns the number of messages decoded. Without a source this does
    /// nothing. A malformed line is counted and skipped; it never stops the
    /// drain.
    ///
    /// Lines are not held across calls. When the source runs dry mid-line,
    /// as happens when a TCP segment boundary splits a line, the bytes read
    /// so far are decoded as a line of their own and the remainder arrives as
    /// a separate line on a later call. The prefix may decode into a message
    /// with a truncated payload; the remainder is normally rejected.
    pub fn pump_once(&mut self) -> usize {
        let Some(source) = self.source.as_mut() else {
            return 0;
        };

        let options = DecodeOptions {
            max_payload_len: self.config.max_payload_len,
            source_fallback: Some(self.config.default_source),
        };
        let mut decoded = 0usize;

        loop {
            self.state = PumpState::Accumulating;
            let Some(line) = self.accumulator.read_line(source, self.config.terminator) else {
                break;
            };
            let result = decode_with(line, &options);

            self.stats.lines += 1;
            if self.accumulator.buffer().overflowed() {
                self.stats.truncated += 1;
            }

            match result {
                Ok(message) => {
                    self.stats.decoded += 1;
                    decoded += 1;
                    debug!(
                        pgn = message.pgn,
                        source = message.source,
                        destination = message.destination,
                        len = message.payload.len(),
                        "decoded line"
                    );
                    if let Some(handler) = self.handler.as_mut() {
                        handler.handle(&message);
                    }
                }
                Err(err) => {
                    self.stats.rejected += 1;
                    debug!(error = %err, "rejected line");
                }
            }
        }

        self.state = PumpState::Idle;
        if decoded > 0 {
            trace!(decoded, "pump cycle complete");
        }
        decoded
    }

    /// Current state.
    pub fn state(&self) -> PumpState {
        self.state
    }

    /// Counters since creation.
    pub fn stats(&self) -> PumpStats {
        self.stats
    }

    /// Current pump configuration.
    pub fn config(&self) -> &PumpConfig {
        &self.config
    }
}

impl<S: ByteSource> Default for MessagePump<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> std::fmt::Debug for MessagePump<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessagePump")
            .field("attached", &self.source.is_some())
            .field("has_handler", &self.handler.is_some())
            .field("state", &self.state)
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use super::*;

    type Received = Rc<RefCell<Vec<WireMessage>>>;

    fn recording_pump(input: &[u8]) -> (MessagePump<VecDeque<u8>>, Received) {
        let received: Received = Rc::default();
        let sink = Rc::clone(&received);

        let mut pump = MessagePump::new();
        pump.set_handler(move |msg: &WireMessage| sink.borrow_mut().push(msg.clone()));
        pump.attach_source(input.iter().copied().collect());
        (pump, received)
    }

    #[test]
    fn drains_all_queued_lines_in_order() {
        let input = b"A173321.107 23FF7 1F513 01\n\
                      A173321.108 24FF7 1F514 02\n\
                      A173321.109 25FF7 1F515 03\n";
        let (mut pump, received) = recording_pump(input);

        assert_eq!(pump.pump_once(), 3);

        let received = received.borrow();
        let pgns: Vec<u32> = received.iter().map(|m| m.pgn).collect();
        assert_eq!(pgns, vec![0x1F513, 0x1F514, 0x1F515]);
        assert_eq!(received[2].payload.as_ref(), &[0x03]);
        assert_eq!(pump.state(), PumpState::Idle);
    }

    #[test]
    fn line_split_across_reads_dispatches_prefix() {
        let (mut pump, received) = recording_pump(b"A173321.107 23FF7 1F513 01");
        assert_eq!(pump.pump_once(), 1);
        assert_eq!(received.borrow()[0].payload.as_ref(), &[0x01]);

        let mut source = pump.detach_source().expect("source should be attached");
        source.extend(b"02\n");
        pump.attach_source(source);
        assert_eq!(pump.pump_once(), 0);

        let stats = pump.stats();
        assert_eq!(stats.lines, 2);
        assert_eq!(stats.decoded, 1);
        assert_eq!(stats.rejected, 1);
    }

    #[test]
    fn detached_pump_is_noop() {
        let calls = Rc::new(RefCell::new(0usize));
        let counter = Rc::clone(&calls);
        let mut pump: MessagePump<VecDeque<u8>> = MessagePump::new();
        pump.set_handler(move |_: &WireMessage| *counter.borrow_mut() += 1);

        assert_eq!(pump.state(), PumpState::Detached);
        assert_eq!(pump.pump_once(), 0);
        assert_eq!(*calls.borrow(), 0);
        assert_eq!(pump.stats(), PumpStats::default());
    }

    #[test]
    fn malformed_line_does_not_stop_drain() {
        let input = b"garbage\nA12\nA173321.107 23FF7 1F513 0102\n";
        let (mut pump, received) = recording_pump(input);

        assert_eq!(pump.pump_once(), 1);
        assert_eq!(received.borrow().len(), 1);

        let stats = pump.stats();
        assert_eq!(stats.lines, 3);
        assert_eq!(stats.rejected, 2);
        assert_eq!(stats.decoded, 1);
    }

    #[test]
    fn empty_source_returns_immediately() {
        let (mut pump, received) = recording_pump(b"");
        assert_eq!(pump.pump_once(), 0);
        assert!(received.borrow().is_empty());
        assert_eq!(pump.stats().lines, 0);
    }

    #[test]
    fn detach_stops_processing() {
        let (mut pump, received) = recording_pump(b"A173321.107 23FF7 1F513 01\n");
        let source = pump.detach_source().expect("source should be attached");

        assert_eq!(pump.pump_once(), 0);
        assert!(received.borrow().is_empty());
        assert_eq!(source.len(), 27);

        pump.attach_source(source);
        assert_eq!(pump.pump_once(), 1);
    }

    #[test]
    fn attach_returns_previous_source() {
        let mut pump: MessagePump<VecDeque<u8>> = MessagePump::new();
        assert!(pump.attach_source(VecDeque::from(vec![b'x'])).is_none());

        let previous = pump.attach_source(VecDeque::new()).unwrap();
        assert_eq!(previous, VecDeque::from(vec![b'x']));
        assert!(pump.is_attached());
    }

    #[test]
    fn default_source_fills_blank_source_field() {
        let (mut pump, received) = recording_pump(b"A173321.107   FF7 1F513 01\n");
        assert_eq!(pump.default_source_address(), DEFAULT_SOURCE_ADDRESS);
        pump.set_default_source_address(75);

        pump.pump_once();
        assert_eq!(received.borrow()[0].source, 75);
    }

    #[test]
    fn replacing_handler_routes_to_new_one() {
        let (mut pump, first) = recording_pump(b"A173321.107 23FF7 1F513 01\n");
        let second: Received = Rc::default();
        let sink = Rc::clone(&second);
        pump.set_handler(move |msg: &WireMessage| sink.borrow_mut().push(msg.clone()));

        pump.pump_once();
        assert!(first.borrow().is_empty());
        assert_eq!(second.borrow().len(), 1);
    }

    #[test]
    fn no_handler_still_counts() {
        let mut pump = MessagePump::new();
        pump.attach_source(b"A173321.107 23FF7 1F513 01\n".iter().copied().collect::<VecDeque<u8>>());

        assert_eq!(pump.pump_once(), 1);
        assert_eq!(pump.stats().decoded, 1);
    }

    #[test]
    fn oversized_line_is_truncated_and_counted() {
        let config = PumpConfig {
            line_capacity: 30,
            ..PumpConfig::default()
        };
        let mut pump = MessagePump::with_config(config);
        let mut input = b"A173321.107 23FF7 1F513 ".to_vec();
        input.extend_from_slice(&b"AB".repeat(40));
        input.push(b'\n');
        pump.attach_source(input.into_iter().collect::<VecDeque<u8>>());

        assert_eq!(pump.pump_once(), 1);
        let stats = pump.stats();
        assert_eq!(stats.truncated, 1);
        assert_eq!(stats.decoded, 1);
    }

    #[test]
    fn struct_handler_is_supported() {
        struct Counter(Rc<RefCell<u32>>);

        impl MessageHandler for Counter {
            fn handle(&mut self, message: &WireMessage) {
                *self.0.borrow_mut() += message.pgn;
            }
        }

        let total = Rc::new(RefCell::new(0));
        let mut pump = MessagePump::new();
        pump.set_handler(Counter(Rc::clone(&total)));
        pump.attach_source(
            b"A173321.107 23FF7 00001 \nA173321.107 23FF7 00002 \n"
                .iter()
                .copied()
                .collect::<VecDeque<u8>>(),
        );

        pump.pump_once();
        assert_eq!(*total.borrow(), 3);
    }
}
