//! Errors surfaced by the public [`Gateway`](crate::Gateway) API.

use std::net::SocketAddr;

use thiserror::Error;

use crate::domain::ConfigError;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The listener could not be bound (address in use, permission denied).
    #[error("failed to bind WebSocket listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid gateway configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// An outbound frame could not be serialized.
    #[error("failed to encode outbound frame: {0}")]
    Encode(#[from] serde_json::Error),
}
