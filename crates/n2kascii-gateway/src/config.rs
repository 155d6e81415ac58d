use std::path::Path;
use std::time::Duration;

use n2kascii_codec::{PumpConfig, DEFAULT_ENCODE_CAPACITY, DEFAULT_LINE_CAPACITY};
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};

/// Gateway configuration, loadable from a JSON file.
///
/// Every field is optional in the file; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    /// Address the text server listens on. Default: `0.0.0.0:60001`.
    pub bind: String,
    /// Source address for lines without a usable source field. Default: 75.
    pub default_source: u8,
    /// Delay between pump cycles. Default: 1 ms.
    pub pump_interval_ms: u64,
    /// Delay between checks for a new client. Default: 1000 ms.
    pub accept_interval_ms: u64,
    /// Bound on one incoming line. Default: 300.
    pub line_capacity: usize,
    /// Buffer size for outgoing lines. Default: 512.
    pub encode_capacity: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:60001".to_string(),
            default_source: 75,
            pump_interval_ms: 1,
            accept_interval_ms: 1000,
            line_capacity: DEFAULT_LINE_CAPACITY,
            encode_capacity: DEFAULT_ENCODE_CAPACITY,
        }
    }
}

impl GatewayConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|err| GatewayError::Config(format!("{}: {err}", path.display())))?;
        Self::from_json(&text)
    }

    /// Reject values the gateway cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.bind.trim().is_empty() {
            return Err(GatewayError::Config("bind address must not be empty".into()));
        }
        if self.line_capacity == 0 {
            return Err(GatewayError::Config("line_capacity must be greater than zero".into()));
        }
        if self.encode_capacity == 0 {
            return Err(GatewayError::Config(
                "encode_capacity must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Pump settings derived from this configuration.
    pub fn pump_config(&self) -> PumpConfig {
        PumpConfig {
            line_capacity: self.line_capacity,
            default_source: self.default_source,
            ..PumpConfig::default()
        }
    }

    pub fn pump_interval(&self) -> Duration {
        Duration::from_millis(self.pump_interval_ms)
    }

    pub fn accept_interval(&self) -> Duration {
        Duration::from_millis(self.accept_interval_ms)
    }
}
