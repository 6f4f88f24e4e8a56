//! Bounded, drop-oldest update queue.
//!
//! Sessions push from their read tasks and must never wait on a slow bot, so
//! [`UpdateQueue::push`] is synchronous: when the buffer is full the oldest
//! undelivered update is discarded to make room.  The `update_id` is stamped
//! under the same lock that appends, so ids leave the queue strictly
//! increasing no matter which session produced them.
//!
//! This is a test double's buffer, not a broker: nothing is persisted and
//! nothing is acknowledged.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use telemock_core::{IdCounter, Update, UpdateKind};
use tokio::sync::Notify;
use tracing::debug;

/// What happened to a pushed payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Appended with this `update_id`.
    Queued { update_id: i64 },
    /// Appended after discarding the oldest queued update.
    Evicted { update_id: i64, evicted_id: i64 },
    /// The queue is closed; the payload was dropped.
    Closed,
}

struct QueueState {
    buffer: VecDeque<Update>,
    closed: bool,
}

pub struct UpdateQueue {
    state: Mutex<QueueState>,
    available: Notify,
    capacity: usize,
    update_ids: IdCounter,
}

impl UpdateQueue {
    /// Creates a queue holding at most `capacity` updates (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Mutex::new(QueueState {
                buffer: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            available: Notify::new(),
            capacity,
            update_ids: IdCounter::new(),
        }
    }

    /// Stamps the next `update_id` on `kind` and appends it.  Never blocks.
    pub fn push(&self, kind: UpdateKind) -> PushOutcome {
        let outcome = {
            let mut state = self.lock();
            if state.closed {
                return PushOutcome::Closed;
            }
            let evicted = if state.buffer.len() >= self.capacity {
                state.buffer.pop_front().map(|u| u.update_id)
            } else {
                None
            };
            let update_id = self.update_ids.next();
            state.buffer.push_back(Update { update_id, kind });
            match evicted {
                Some(evicted_id) => PushOutcome::Evicted {
                    update_id,
                    evicted_id,
                },
                None => PushOutcome::Queued { update_id },
            }
        };
        if let PushOutcome::Evicted { evicted_id, .. } = outcome {
            debug!("update queue full; dropped update {evicted_id}");
        }
        self.available.notify_one();
        outcome
    }

    /// Waits for the next update.
    ///
    /// Returns `None` once the queue is closed *and* drained: updates pushed
    /// before `close` are still handed out.
    ///
    /// Cancel safe: dropping the future never loses an update.
    pub async fn pop(&self) -> Option<Update> {
        loop {
            // Register interest before checking, so a push between the check
            // and the await still wakes us.
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if let Some(update) = state.buffer.pop_front() {
                    return Some(update);
                }
                if state.closed {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Takes the next update if one is buffered.
    pub fn try_pop(&self) -> Option<Update> {
        self.lock().buffer.pop_front()
    }

    /// Refuses further pushes and wakes every waiting consumer.
    pub fn close(&self) {
        self.lock().closed = true;
        self.available.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn len(&self) -> usize {
        self.lock().buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        // No critical section can leave the buffer half-updated.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use telemock_core::{Chat, Message};

    use super::*;

    fn text(s: &str) -> UpdateKind {
        UpdateKind::Message(Message {
            message_id: 1,
            from: None,
            chat: Chat { id: 1 },
            text: s.to_string(),
            entities: Vec::new(),
        })
    }

    fn text_of(update: &Update) -> &str {
        &update.as_message().unwrap().text
    }

    #[test]
    fn test_push_assigns_increasing_ids_from_one() {
        // Arrange
        let queue = UpdateQueue::new(4);

        // Act
        let a = queue.push(text("a"));
        let b = queue.push(text("b"));

        // Assert
        assert_eq!(a, PushOutcome::Queued { update_id: 1 });
        assert_eq!(b, PushOutcome::Queued { update_id: 2 });
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_full_queue_evicts_oldest() {
        // Arrange
        let queue = UpdateQueue::new(2);
        queue.push(text("a"));
        queue.push(text("b"));

        // Act
        let outcome = queue.push(text("c"));

        // Assert
        assert_eq!(
            outcome,
            PushOutcome::Evicted {
                update_id: 3,
                evicted_id: 1
            }
        );
        assert_eq!(queue.len(), 2);
        assert_eq!(text_of(&queue.try_pop().unwrap()), "b");
        assert_eq!(text_of(&queue.try_pop().unwrap()), "c");
        assert!(queue.try_pop().is_none());
    }

    #[test]
    fn test_overflow_keeps_newest_capacity_updates() {
        // Arrange
        let queue = UpdateQueue::new(256);

        // Act
        for i in 0..300 {
            queue.push(text(&i.to_string()));
        }

        // Assert
        assert_eq!(queue.len(), 256);
        let first = queue.try_pop().unwrap();
        assert_eq!(first.update_id, 45);
        assert_eq!(text_of(&first), "44");
    }

    #[test]
    fn test_zero_capacity_is_treated_as_one() {
        let queue = UpdateQueue::new(0);
        queue.push(text("a"));
        queue.push(text("b"));
        assert_eq!(queue.capacity(), 1);
        assert_eq!(text_of(&queue.try_pop().unwrap()), "b");
    }

    #[test]
    fn test_push_after_close_is_dropped() {
        let queue = UpdateQueue::new(4);
        queue.close();
        assert_eq!(queue.push(text("late")), PushOutcome::Closed);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_pop_waits_for_push() {
        // Arrange
        let queue = Arc::new(UpdateQueue::new(4));
        let consumer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.pop().await })
        };
        tokio::task::yield_now().await;

        // Act
        queue.push(text("wake"));
        let update = tokio::time::timeout(Duration::from_secs(1), consumer)
            .await
            .expect("consumer woke")
            .unwrap();

        // Assert
        assert_eq!(text_of(&update.unwrap()), "wake");
    }

    #[tokio::test]
    async fn test_close_drains_then_ends() {
        // Arrange
        let queue = UpdateQueue::new(4);
        queue.push(text("buffered"));

        // Act
        queue.close();

        // Assert
        assert_eq!(text_of(&queue.pop().await.unwrap()), "buffered");
        assert!(queue.pop().await.is_none());
    }

    #[tokio::test]
    async fn test_close_wakes_waiting_consumer() {
        // Arrange
        let queue = Arc::new(UpdateQueue::new(4));
        let consumer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.pop().await })
        };
        tokio::task::yield_now().await;

        // Act
        queue.close();
        let result = tokio::time::timeout(Duration::from_secs(1), consumer)
            .await
            .expect("consumer woke")
            .unwrap();

        // Assert
        assert!(result.is_none());
        assert!(queue.is_closed());
    }

    #[tokio::test]
    async fn test_cancelled_pop_loses_nothing() {
        // Arrange
        let queue = UpdateQueue::new(4);

        // Act
        let timed_out = tokio::time::timeout(Duration::from_millis(10), queue.pop()).await;
        queue.push(text("kept"));

        // Assert
        assert!(timed_out.is_err());
        assert_eq!(text_of(&queue.pop().await.unwrap()), "kept");
    }

    #[test]
    fn test_concurrent_pushes_keep_ids_unique() {
        // Arrange
        let queue = Arc::new(UpdateQueue::new(1024));

        // Act
        let threads: Vec<_> = (0..4)
            .map(|_| {
                let queue = Arc::clone(&queue);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        queue.push(text("x"));
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }

        // Assert
        let ids: Vec<i64> = std::iter::from_fn(|| queue.try_pop())
            .map(|u| u.update_id)
            .collect();
        assert_eq!(ids, (1..=400).collect::<Vec<_>>());
    }
}
