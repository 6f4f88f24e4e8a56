//! Outbound broadcast: writes one payload to every registered session.
//!
//! Each write is bounded by the configured deadline and all writes run
//! concurrently, so one stalled session costs at most one deadline.  Sessions
//! whose write fails are removed from the registry on a background task.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::domain::SessionId;
use crate::infrastructure::registry::SessionRegistry;
use crate::infrastructure::session::SessionError;

/// Per-broadcast tallies, mostly for logging and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    pub attempted: usize,
    pub delivered: usize,
    pub pruned: usize,
}

pub struct Broadcaster {
    registry: Arc<SessionRegistry>,
    write_timeout: Duration,
}

impl Broadcaster {
    pub fn new(registry: Arc<SessionRegistry>, write_timeout: Duration) -> Self {
        Self {
            registry,
            write_timeout,
        }
    }

    /// Sends `payload` to a snapshot of the registered sessions.
    ///
    /// Never fails: an empty registry is a successful no-op, and per-session
    /// failures only prune that session.
    pub async fn broadcast(&self, payload: &str) -> BroadcastReport {
        let sessions = self.registry.snapshot().await;
        if sessions.is_empty() {
            debug!("no sessions connected; reply not delivered");
            return BroadcastReport::default();
        }

        let writes = sessions.iter().map(|handle| async move {
            let result = match timeout(self.write_timeout, handle.sink.send_text(payload)).await {
                Ok(result) => result,
                Err(_) => Err(SessionError::TimedOut),
            };
            (handle.id, result)
        });

        let mut report = BroadcastReport {
            attempted: sessions.len(),
            ..BroadcastReport::default()
        };
        for (id, result) in join_all(writes).await {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!("session {id}: write failed ({e}); dropping session");
                    self.prune(id);
                    report.pruned += 1;
                }
            }
        }
        debug!(
            "broadcast delivered to {}/{} sessions",
            report.delivered, report.attempted
        );
        report
    }

    fn prune(&self, id: SessionId) {
        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            if registry.remove(id).await {
                debug!("session {id} pruned");
            }
        });
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
