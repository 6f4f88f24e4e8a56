//! Long-poll adapter: exposes the update queue as a cancellable stream.
//!
//! A forwarding task moves updates from the shared queue into a one-slot
//! channel owned by the caller.  The task stops when the caller's token is
//! cancelled, when the caller drops the stream, or when the queue is closed
//! and drained; the stream then ends.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::Stream;
use telemock_core::Update;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::infrastructure::update_queue::UpdateQueue;

/// Updates for one consumer, in `update_id` order.
#[derive(Debug)]
pub struct UpdateStream {
    rx: mpsc::Receiver<Update>,
}

impl UpdateStream {
    /// Waits for the next update.  `None` means the stream has ended.
    pub async fn recv(&mut self) -> Option<Update> {
        self.rx.recv().await
    }
}

impl Stream for UpdateStream {
    type Item = Update;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Update>> {
        self.rx.poll_recv(cx)
    }
}

/// Starts forwarding from `queue` until `cancel` fires.
///
/// Must be called from within a Tokio runtime.
pub fn spawn_long_poll(queue: Arc<UpdateQueue>, cancel: CancellationToken) -> UpdateStream {
    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(async move {
        loop {
            // `pop` is cancel safe, so losing this race never drops an update.
            let update = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tx.closed() => break,
                next = queue.pop() => match next {
                    Some(update) => update,
                    None => break,
                },
            };

            let update_id = update.update_id;
            tokio::select! {
                biased;
                sent = tx.send(update) => {
                    if sent.is_err() {
                        debug!("long-poll consumer went away; update {update_id} dropped");
                        break;
                    }
                }
                _ = cancel.cancelled() => {
                    debug!("long poll cancelled; update {update_id} dropped");
                    break;
                }
            }
        }
        debug!("long-poll forwarder stopped");
    });
    UpdateStream { rx }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures_util::StreamExt;
    use telemock_core::{Chat, Message, UpdateKind};
    use tokio::time::timeout;

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

    const WAIT: Duration = Duration::from_secs(1);

    #[tokio::test]
    async fn test_stream_yields_in_order() {
        // Arrange
        let queue = Arc::new(UpdateQueue::new(8));
        queue.push(text("a"));
        queue.push(text("b"));
        let mut updates = spawn_long_poll(Arc::clone(&queue), CancellationToken::new());

        // Act
        let first = timeout(WAIT, updates.recv()).await.unwrap().unwrap();
        let second = timeout(WAIT, updates.recv()).await.unwrap().unwrap();

        // Assert
        assert_eq!(first.update_id, 1);
        assert_eq!(second.update_id, 2);
    }

    #[tokio::test]
    async fn test_cancel_ends_stream() {
        // Arrange
        let queue = Arc::new(UpdateQueue::new(8));
        let cancel = CancellationToken::new();
        let mut updates = spawn_long_poll(Arc::clone(&queue), cancel.clone());

        // Act
        cancel.cancel();

        // Assert
        let end = timeout(WAIT, updates.recv()).await.expect("stream ends promptly");
        assert!(end.is_none());
    }

    #[tokio::test]
    async fn test_updates_after_cancel_stay_queued() {
        // Arrange
        let queue = Arc::new(UpdateQueue::new(8));
        let cancel = CancellationToken::new();
        let mut updates = spawn_long_poll(Arc::clone(&queue), cancel.clone());
        cancel.cancel();
        assert!(timeout(WAIT, updates.recv()).await.unwrap().is_none());

        // Act
        queue.push(text("later"));

        // Assert
        assert_eq!(queue.len(), 1, "nobody consumed it");
    }

    #[tokio::test]
    async fn test_closed_queue_drains_then_ends() {
        // Arrange
        let queue = Arc::new(UpdateQueue::new(8));
        queue.push(text("last"));
        queue.close();

        // Act
        let collected: Vec<Update> = timeout(
            WAIT,
            spawn_long_poll(Arc::clone(&queue), CancellationToken::new()).collect(),
        )
        .await
        .unwrap();

        // Assert
        assert_eq!(collected.len(), 1);
        assert_eq!(collected[0].update_id, 1);
    }

    #[tokio::test]
    async fn test_dropped_stream_leaves_updates_queued() {
        // Arrange
        let queue = Arc::new(UpdateQueue::new(8));
        let updates = spawn_long_poll(Arc::clone(&queue), CancellationToken::new());

        // Act
        drop(updates);
        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.push(text("kept"));
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Assert
        assert_eq!(queue.len(), 1);
    }
}
