//! Gateway configuration types.
//!
//! [`GatewayConfig`] is the single source of truth for all runtime settings.
//! The defaults reproduce the fixed endpoint and limits a bot test suite
//! expects (`127.0.0.1:8765`, 256 queued updates, 2 s deadlines); tests
//! override `bind_addr` with port 0 so they can run in parallel.
//!
//! Keeping configuration as a plain struct (no global state, no environment
//! variable reads inside the library) makes the gateway easy to embed in
//! tests.  The binary is responsible for populating the struct from CLI args
//! or environment variables.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use thiserror::Error;

/// Default listening endpoint.
pub const DEFAULT_BIND_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8765);
/// Default Update Queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;
/// Default per-session write deadline.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(2);
/// Default bound on each shutdown wait.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// A configuration value that cannot be used.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("queue capacity must be at least 1")]
    ZeroQueueCapacity,
    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// All runtime configuration for the gateway.
///
/// # Example
///
/// ```rust
/// use telemock::GatewayConfig;
///
/// let cfg = GatewayConfig::default();
/// assert_eq!(cfg.bind_addr.port(), 8765);
/// assert_eq!(cfg.queue_capacity, 256);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Address the WebSocket listener binds to.  Port 0 asks the OS for an
    /// ephemeral port; read it back with `Gateway::local_addr`.
    pub bind_addr: SocketAddr,

    /// Maximum number of undelivered updates.  When full, the oldest update
    /// is dropped to make room for the newest.
    pub queue_capacity: usize,

    /// Deadline for writing one reply to one session.  A session that misses
    /// it is dropped from the registry.
    pub write_timeout: Duration,

    /// Bound on how long `close` waits for the accept loop to exit, and on
    /// how long closing a single session may take.
    pub shutdown_timeout: Duration,
}

impl GatewayConfig {
    /// Returns a default configuration bound to `addr`.
    pub fn with_bind_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Self::default()
        }
    }

    /// Checks the values that would make the gateway unusable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a zero queue capacity or a zero timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        if self.write_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout("write timeout"));
        }
        if self.shutdown_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout("shutdown timeout"));
        }
        Ok(())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
