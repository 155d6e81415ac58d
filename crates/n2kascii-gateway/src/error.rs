/// Errors that can occur in gateway operations.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] n2kascii_transport::TransportError),

    /// Line codec error.
    #[error("codec error: {0}")]
    Codec(#[from] n2kascii_codec::CodecError),

    /// The bus refused or failed to send a message.
    #[error("bus send failed: {0}")]
    Bus(String),

    /// The configuration could not be loaded.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// JSON deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GatewayError>;
