//! Session transport seam.
//!
//! The registry and the broadcaster only ever talk to a session through the
//! [`SessionSink`] trait.  Production code uses [`WsSession`], the write half
//! of an accepted WebSocket; unit tests substitute `MockSessionSink` so write
//! failures and stalls can be produced on demand without a socket.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::SplitSink;
use futures_util::SinkExt;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::WebSocketStream;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::SessionId;

/// Why a write to a session failed.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session is closed")]
    Closed,
    #[error("write deadline exceeded")]
    TimedOut,
    #[error("transport error: {0}")]
    Transport(#[from] WsError),
}

/// The writable side of one session.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionSink: Send + Sync {
    /// Writes one text frame.
    async fn send_text(&self, text: &str) -> Result<(), SessionError>;

    /// Closes the transport.  Calling it more than once is harmless.
    async fn close(&self);
}

/// A registered session: identity plus its sink.
#[derive(Clone)]
pub struct SessionHandle {
    pub id: SessionId,
    pub peer: SocketAddr,
    pub sink: Arc<dyn SessionSink>,
}

impl SessionHandle {
    pub fn new(id: SessionId, peer: SocketAddr, sink: Arc<dyn SessionSink>) -> Self {
        Self { id, peer, sink }
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id)
            .field("peer", &self.peer)
            .finish_non_exhaustive()
    }
}

type WsWriter = SplitSink<WebSocketStream<TcpStream>, WsMessage>;

/// Write half of an accepted WebSocket.
///
/// Writes are serialized through an async mutex; the session's read task
/// owns the other half.  `closed` is shared with that read task so closing
/// the sink also stops the reader.
pub struct WsSession {
    writer: Mutex<WsWriter>,
    closed: CancellationToken,
    close_timeout: Duration,
}

impl WsSession {
    pub fn new(writer: WsWriter, closed: CancellationToken, close_timeout: Duration) -> Self {
        Self {
            writer: Mutex::new(writer),
            closed,
            close_timeout,
        }
    }

    /// Token cancelled once the session is closed, from either side.
    pub fn closed_token(&self) -> CancellationToken {
        self.closed.clone()
    }
}

#[async_trait]
impl SessionSink for WsSession {
    async fn send_text(&self, text: &str) -> Result<(), SessionError> {
        if self.closed.is_cancelled() {
            return Err(SessionError::Closed);
        }
        let mut writer = self.writer.lock().await;
        writer.send(WsMessage::Text(text.to_owned())).await?;
        Ok(())
    }

    async fn close(&self) {
        self.closed.cancel();
        // A peer that stopped reading can hold the close handshake forever.
        let result = timeout(self.close_timeout, async {
            let mut writer = self.writer.lock().await;
            writer.close().await
        })
        .await;
        match result {
            Ok(Ok(())) => {}
            Ok(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) => {}
            Ok(Err(e)) => debug!("close handshake failed: {e}"),
            Err(_) => debug!("close handshake timed out after {:?}", self.close_timeout),
        }
    }
}
