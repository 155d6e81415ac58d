use std::sync::atomic::{AtomicU64, Ordering};

use n2kascii_codec::WireMessage;

use crate::error::Result;

/// The bus side of the gateway.
///
/// Implemented by whatever owns the CAN transceiver. `send` must not block
/// for long: it runs inside the pump's handler.
pub trait BusSender {
    fn send(&mut self, message: &WireMessage) -> Result<()>;
}

impl<F> BusSender for F
where
    F: FnMut(&WireMessage) -> Result<()>,
{
    fn send(&mut self, message: &WireMessage) -> Result<()> {
        self(message)
    }
}

/// Message counters shared between the gateway and its pump handler.
#[derive(Debug, Default)]
pub struct GatewayCounters {
    from_client: AtomicU64,
    from_bus: AtomicU64,
    bus_errors: AtomicU64,
    clients: AtomicU64,
}

impl GatewayCounters {
    /// Messages decoded from the text client and handed to the bus.
    pub fn from_client(&self) -> u64 {
        self.from_client.load(Ordering::Relaxed)
    }

    /// Bus messages forwarded to the text client.
    pub fn from_bus(&self) -> u64 {
        self.from_bus.load(Ordering::Relaxed)
    }

    /// Bus sends that failed.
    pub fn bus_errors(&self) -> u64 {
        self.bus_errors.load(Ordering::Relaxed)
    }

    /// Text clients accepted so far.
    pub fn clients(&self) -> u64 {
        self.clients.load(Ordering::Relaxed)
    }

    pub(crate) fn record_from_client(&self) {
        self.from_client.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_from_bus(&self) {
        self.from_bus.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_bus_error(&self) {
        self.bus_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_client(&self) -> u64 {
        self.clients.fetch_add(1, Ordering::Relaxed) + 1
    }
}
