//! Domain layer for the gateway.
//!
//! Pure types with no dependencies on I/O, networking, or the async runtime:
//! the gateway configuration and session identity.  The update data model
//! itself lives in `telemock-core` because harnesses share it.

pub mod config;
pub mod session;

pub use config::{
    ConfigError, GatewayConfig, DEFAULT_BIND_ADDR, DEFAULT_QUEUE_CAPACITY, DEFAULT_SHUTDOWN_TIMEOUT,
    DEFAULT_WRITE_TIMEOUT,
};
pub use session::SessionId;
