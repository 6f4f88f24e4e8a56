//! WebSocket server: accept loop and per-session read tasks.
//!
//! This module is responsible for:
//!
//! 1. Accepting TCP connections on the already-bound listener.
//! 2. Upgrading each connection to a WebSocket session.
//! 3. Registering the session's write half with the [`SessionRegistry`].
//! 4. Reading frames until the peer leaves or the gateway shuts down, feeding
//!    each one through the [`InboundDispatcher`] into the [`UpdateQueue`].
//! 5. Removing the session from the registry on exit, whatever the cause.
//!
//! Each session runs in its own Tokio task, so one slow or misbehaving test
//! client never delays the others.  Shutdown is driven by a
//! [`CancellationToken`]; every session token is a child of it.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use futures_util::stream::SplitStream;
use futures_util::StreamExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{
    accept_async,
    tungstenite::{Error as WsError, Message as WsMessage},
    WebSocketStream,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::application::InboundDispatcher;
use crate::domain::SessionId;
use crate::infrastructure::registry::SessionRegistry;
use crate::infrastructure::session::{SessionHandle, WsSession};
use crate::infrastructure::update_queue::{PushOutcome, UpdateQueue};

/// Pause after a failed `accept` (for example, out of file descriptors).
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// Everything a session task needs, cloned once per connection.
#[derive(Clone)]
pub struct SessionContext {
    pub registry: Arc<SessionRegistry>,
    pub queue: Arc<UpdateQueue>,
    pub dispatcher: InboundDispatcher,
    /// Bound on the close handshake of one session.
    pub close_timeout: Duration,
}

// ── Accept loop ───────────────────────────────────────────────────────────────

/// Accepts connections until `shutdown` is cancelled.
pub async fn run_accept_loop(listener: TcpListener, ctx: SessionContext, shutdown: CancellationToken) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("shutdown requested; stopping accept loop");
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, peer_addr)) => {
                    debug!("new connection from {peer_addr}");
                    let ctx = ctx.clone();
                    let session_token = shutdown.child_token();
                    tokio::spawn(async move {
                        handle_session(stream, peer_addr, ctx, session_token).await;
                    });
                }
                Err(e) => {
                    // Transient accept error; keep serving the existing sessions.
                    error!("accept error: {e}");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }
}

// ── Per-session handler ───────────────────────────────────────────────────────

/// Wraps [`run_session`] and logs the outcome.
async fn handle_session(
    raw_stream: TcpStream,
    peer_addr: SocketAddr,
    ctx: SessionContext,
    closed: CancellationToken,
) {
    match run_session(raw_stream, peer_addr, ctx, closed).await {
        Ok(()) => debug!("connection {peer_addr} finished"),
        Err(e) => warn!("connection {peer_addr} closed with error: {e:#}"),
    }
}

async fn run_session(
    raw_stream: TcpStream,
    peer_addr: SocketAddr,
    ctx: SessionContext,
    closed: CancellationToken,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(raw_stream)
        .await
        .with_context(|| format!("WebSocket handshake failed with {peer_addr}"))?;

    let (ws_tx, mut ws_rx) = ws_stream.split();
    let id = SessionId::new();
    let session = Arc::new(WsSession::new(ws_tx, closed.clone(), ctx.close_timeout));

    if !ctx.registry.add(SessionHandle::new(id, peer_addr, session)).await {
        debug!("session {id} ({peer_addr}) arrived during shutdown; closed");
        return Ok(());
    }
    info!("session {id} connected from {peer_addr}");

    let result = read_frames(id, &mut ws_rx, &ctx, &closed).await;

    // Idempotent: a failed broadcast may already have pruned the session.
    ctx.registry.remove(id).await;
    info!("session {id} ({peer_addr}) disconnected");
    result
}

/// Reads frames until the peer closes, the transport fails, or `closed` is
/// cancelled.
async fn read_frames(
    id: SessionId,
    ws_rx: &mut SplitStream<WebSocketStream<TcpStream>>,
    ctx: &SessionContext,
    closed: &CancellationToken,
) -> anyhow::Result<()> {
    loop {
        let next = tokio::select! {
            _ = closed.cancelled() => return Ok(()),
            next = ws_rx.next() => next,
        };

        let ws_msg = match next {
            Some(Ok(msg)) => msg,
            Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) | None => {
                return Ok(());
            }
            Some(Err(WsError::Protocol(e))) => {
                // Peers that drop the TCP connection without a close frame
                // show up here; nothing to report beyond debug.
                debug!("session {id}: protocol error: {e}");
                return Ok(());
            }
            Some(Err(e)) => {
                return Err(e).with_context(|| format!("session {id}: read failed"));
            }
        };

        match ws_msg {
            WsMessage::Text(text) => ingest(id, &text, ctx),
            WsMessage::Binary(bytes) => match std::str::from_utf8(&bytes) {
                Ok(text) => ingest(id, text, ctx),
                Err(_) => warn!("session {id}: non-UTF-8 binary frame ignored"),
            },
            WsMessage::Ping(_) | WsMessage::Pong(_) => {
                // tungstenite answers pings while the stream is polled.
            }
            WsMessage::Close(frame) => {
                debug!("session {id}: close frame received: {frame:?}");
                return Ok(());
            }
            WsMessage::Frame(_) => {
                // Only produced on the write side.
            }
        }
    }
}

/// Runs one frame through the inbound pipeline.  Bad frames are logged and
/// dropped; the session stays open.
fn ingest(id: SessionId, raw: &str, ctx: &SessionContext) {
    debug!("session {id}: frame received ({} bytes)", raw.len());
    let kind = match ctx.dispatcher.dispatch(raw) {
        Ok(Some(kind)) => kind,
        Ok(None) => {
            debug!("session {id}: empty frame ignored");
            return;
        }
        Err(e) => {
            warn!("session {id}: frame discarded: {e}");
            return;
        }
    };

    match ctx.queue.push(kind) {
        PushOutcome::Queued { update_id } | PushOutcome::Evicted { update_id, .. } => {
            debug!("session {id}: queued update {update_id}");
        }
        PushOutcome::Closed => debug!("session {id}: gateway closing; update dropped"),
    }
}
