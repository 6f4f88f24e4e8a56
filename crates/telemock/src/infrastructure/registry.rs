//! Connection registry: the set of live sessions.
//!
//! Readers (broadcasts) take a snapshot under the read lock and release it
//! before any I/O, so a slow session never blocks registration or removal.
//! Removal takes the handle out under the write lock and closes it after the
//! lock is released.

use std::collections::HashMap;

use futures_util::future::join_all;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::SessionId;
use crate::infrastructure::session::SessionHandle;

#[derive(Default)]
struct Sessions {
    by_id: HashMap<SessionId, SessionHandle>,
    /// Set by `close_all`; later registrations are refused.
    sealed: bool,
}

#[derive(Default)]
pub struct SessionRegistry {
    inner: RwLock<Sessions>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session.
    ///
    /// Returns `false` (and closes the session) if the registry has already
    /// been shut down.
    pub async fn add(&self, handle: SessionHandle) -> bool {
        let refused = {
            let mut sessions = self.inner.write().await;
            if sessions.sealed {
                Some(handle)
            } else {
                sessions.by_id.insert(handle.id, handle);
                None
            }
        };
        match refused {
            Some(handle) => {
                debug!("session {} refused: registry closed", handle.id);
                handle.sink.close().await;
                false
            }
            None => true,
        }
    }

    /// Removes and closes a session.  Returns `false` if it was not present,
    /// which makes repeated removal a no-op.
    pub async fn remove(&self, id: SessionId) -> bool {
        let removed = self.inner.write().await.by_id.remove(&id);
        match removed {
            Some(handle) => {
                handle.sink.close().await;
                true
            }
            None => false,
        }
    }

    /// Point-in-time copy of every registered session.
    pub async fn snapshot(&self) -> Vec<SessionHandle> {
        self.inner.read().await.by_id.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Closes every session and refuses new ones.  Returns how many were
    /// closed.
    pub async fn close_all(&self) -> usize {
        let drained: Vec<SessionHandle> = {
            let mut sessions = self.inner.write().await;
            sessions.sealed = true;
            sessions.by_id.drain().map(|(_, handle)| handle).collect()
        };
        join_all(drained.iter().map(|handle| handle.sink.close())).await;
        drained.len()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::infrastructure::session::MockSessionSink;

    fn handle_with(sink: MockSessionSink) -> SessionHandle {
        SessionHandle::new(
            SessionId::new(),
            "127.0.0.1:40000".parse().unwrap(),
            Arc::new(sink),
        )
    }

    fn closing_sink(times: usize) -> MockSessionSink {
        let mut sink = MockSessionSink::new();
        sink.expect_close().times(times).return_const(());
        sink
    }

    #[tokio::test]
    async fn test_add_then_snapshot_contains_session() {
        // Arrange
        let registry = SessionRegistry::new();
        let handle = handle_with(MockSessionSink::new());
        let id = handle.id;

        // Act
        assert!(registry.add(handle).await);
        let snapshot = registry.snapshot().await;

        // Assert
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, id);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_remove_closes_session_once() {
        // Arrange
        let registry = SessionRegistry::new();
        let handle = handle_with(closing_sink(1));
        let id = handle.id;
        registry.add(handle).await;

        // Act
        let first = registry.remove(id).await;
        let second = registry.remove(id).await;

        // Assert
        assert!(first);
        assert!(!second, "second removal is a no-op");
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_remove_unknown_session_is_noop() {
        let registry = SessionRegistry::new();
        assert!(!registry.remove(SessionId::new()).await);
    }

    #[tokio::test]
    async fn test_snapshot_is_independent_of_later_changes() {
        // Arrange
        let registry = SessionRegistry::new();
        let a = handle_with(closing_sink(1));
        let a_id = a.id;
        registry.add(a).await;
        registry.add(handle_with(MockSessionSink::new())).await;

        // Act
        let snapshot = registry.snapshot().await;
        registry.remove(a_id).await;

        // Assert
        assert_eq!(snapshot.len(), 2);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_close_all_closes_everything_and_seals() {
        // Arrange
        let registry = SessionRegistry::new();
        registry.add(handle_with(closing_sink(1))).await;
        registry.add(handle_with(closing_sink(1))).await;

        // Act
        let closed = registry.close_all().await;
        let late = registry.add(handle_with(closing_sink(1))).await;

        // Assert
        assert_eq!(closed, 2);
        assert!(!late, "registrations after close_all are refused");
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_concurrent_adds_and_removes() {
        // Arrange
        let registry = Arc::new(SessionRegistry::new());
        let handles: Vec<SessionHandle> = (0..32).map(|_| handle_with(closing_sink(1))).collect();
        let ids: Vec<SessionId> = handles.iter().map(|h| h.id).collect();

        // Act
        let adds = handles.into_iter().map(|h| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.add(h).await })
        });
        for task in join_all(adds).await {
            assert!(task.unwrap());
        }
        let removes = ids.into_iter().map(|id| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.remove(id).await })
        });
        let removed = join_all(removes).await;

        // Assert
        assert!(removed.into_iter().all(|r| r.unwrap()));
        assert!(registry.is_empty().await);
    }
}
