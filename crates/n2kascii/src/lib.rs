//! Actisense ASCII codec, message pump and TCP gateway for NMEA 2000.
//!
//! n2kascii moves NMEA 2000 messages between a CAN bus and text clients
//! speaking the Actisense ASCII line format over TCP or serial links.
//!
//! # Crate Structure
//!
//! - [`transport`]: non-blocking byte sources, line sinks and the TCP link
//! - [`codec`]: line decode/encode, line accumulation and the message pump
//! - [`gateway`]: one-client TCP gateway to a bus (behind `gateway` feature)

/// Re-export transport types.
pub mod transport {
    pub use n2kascii_transport::*;
}

/// Re-export codec types.
pub mod codec {
    pub use n2kascii_codec::*;
}

/// Re-export gateway types (requires `gateway` feature).
#[cfg(feature = "gateway")]
pub mod gateway {
    pub use n2kascii_gateway::*;
}
