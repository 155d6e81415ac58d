//! TCP gateway between an NMEA 2000 bus and Actisense ASCII text clients.
//!
//! This is the glue layer. One text client at a time is attached to the
//! message pump; lines it sends reach the bus through a [`BusSender`], and
//! messages seen on the bus are forwarded to it as encoded lines.

pub mod bus;
pub mod config;
pub mod error;
pub mod gateway;

pub use bus::{BusSender, GatewayCounters};
pub use config::GatewayConfig;
pub use error::{GatewayError, Result};
pub use gateway::Gateway;
