//! The gateway: the object a bot under test talks to instead of the real API.
//!
//! ```text
//!  test sessions ──WS──▶ read tasks ──▶ InboundDispatcher ──▶ UpdateQueue ──▶ UpdateStream ──▶ bot
//!  test sessions ◀──WS── Broadcaster ◀── prepare_reply ◀── send_message ◀──────────────────── bot
//! ```
//!
//! Lifecycle: `Starting → Running → Closing → Closed`.  [`Gateway::close`]
//! (or [`Gateway::close_until`]) moves from `Running` to `Closed` once; later
//! calls return immediately.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use telemock_core::{IdCounter, Message, SendMessageParams};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::{prepare_reply, InboundDispatcher};
use crate::domain::GatewayConfig;
use crate::error::GatewayError;
use crate::infrastructure::{
    run_accept_loop, spawn_long_poll, Broadcaster, SessionContext, SessionRegistry, UpdateQueue,
    UpdateStream,
};

/// Where the gateway is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Starting,
    Running,
    Closing,
    Closed,
}

/// A local stand-in for the chat-bot API.
///
/// Dropping a gateway without calling [`close`](Self::close) still stops the
/// accept loop and ends every update stream, but does not wait for them.
pub struct Gateway {
    local_addr: SocketAddr,
    config: GatewayConfig,
    registry: Arc<SessionRegistry>,
    queue: Arc<UpdateQueue>,
    message_ids: Arc<IdCounter>,
    broadcaster: Broadcaster,
    shutdown: CancellationToken,
    accept_task: Mutex<Option<JoinHandle<()>>>,
    state: Mutex<LifecycleState>,
}

impl Gateway {
    /// Starts a gateway on the default endpoint.
    ///
    /// The token is accepted for signature compatibility with the real API
    /// and otherwise ignored.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Bind`] if the endpoint is unavailable.
    pub async fn new(token: &str) -> Result<Self, GatewayError> {
        Self::with_config(token, GatewayConfig::default()).await
    }

    /// Starts a gateway with explicit settings.
    ///
    /// Returns once the listener is bound, so clients may connect as soon as
    /// this resolves.
    ///
    /// # Errors
    ///
    /// [`GatewayError::InvalidConfig`] for unusable settings,
    /// [`GatewayError::Bind`] if the endpoint is unavailable.
    pub async fn with_config(_token: &str, config: GatewayConfig) -> Result<Self, GatewayError> {
        config.validate()?;

        let bind_addr = config.bind_addr;
        let listener = TcpListener::bind(bind_addr)
            .await
            .map_err(|source| GatewayError::Bind {
                addr: bind_addr,
                source,
            })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| GatewayError::Bind {
                addr: bind_addr,
                source,
            })?;

        let registry = Arc::new(SessionRegistry::new());
        let queue = Arc::new(UpdateQueue::new(config.queue_capacity));
        let message_ids = Arc::new(IdCounter::new());
        let shutdown = CancellationToken::new();

        let gateway = Self {
            local_addr,
            broadcaster: Broadcaster::new(Arc::clone(&registry), config.write_timeout),
            registry,
            queue,
            message_ids,
            shutdown,
            accept_task: Mutex::new(None),
            state: Mutex::new(LifecycleState::Starting),
            config,
        };

        let ctx = SessionContext {
            registry: Arc::clone(&gateway.registry),
            queue: Arc::clone(&gateway.queue),
            dispatcher: InboundDispatcher::new(Arc::clone(&gateway.message_ids)),
            close_timeout: gateway.config.shutdown_timeout,
        };
        let task = tokio::spawn(run_accept_loop(listener, ctx, gateway.shutdown.clone()));
        *lock(&gateway.accept_task) = Some(task);
        *lock(&gateway.state) = LifecycleState::Running;

        info!("telemock gateway listening on ws://{local_addr}");
        Ok(gateway)
    }

    /// The bound address; differs from the configured one when port 0 was
    /// requested.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn state(&self) -> LifecycleState {
        *lock(&self.state)
    }

    /// Number of currently registered sessions.
    pub async fn session_count(&self) -> usize {
        self.registry.len().await
    }

    /// Streams queued updates until `cancel` fires or the gateway closes.
    ///
    /// Several streams may run at once; each update goes to exactly one.
    pub fn updates_via_long_polling(&self, cancel: CancellationToken) -> UpdateStream {
        spawn_long_poll(Arc::clone(&self.queue), cancel)
    }

    /// Assigns the next message id, broadcasts the reply to every session,
    /// and returns the sent message.
    ///
    /// Delivery is best-effort: sessions that fail the write are dropped, and
    /// with no sessions connected the call still succeeds.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Encode`] if the outbound frame cannot be serialized.
    pub async fn send_message(&self, params: &SendMessageParams) -> Result<Message, GatewayError> {
        let message_id = self.message_ids.next();
        let reply = prepare_reply(message_id, params)?;
        let report = self.broadcaster.broadcast(&reply.payload).await;
        debug!(
            "message {message_id} to chat {} sent to {} session(s)",
            params.chat_id.id, report.delivered
        );
        Ok(reply.message)
    }

    /// Acknowledges a callback query.  Nothing is sent to sessions.
    pub async fn answer_callback_query(
        &self,
        callback_id: &str,
        text: &str,
    ) -> Result<(), GatewayError> {
        debug!("callback {callback_id} answered: {text:?}");
        Ok(())
    }

    /// Stops accepting, closes every session, ends every update stream, and
    /// waits (bounded by `shutdown_timeout`) for the accept loop to exit.
    ///
    /// Idempotent: only the first call does any work.
    pub async fn close(&self) {
        self.close_until(CancellationToken::new()).await;
    }

    /// Same as [`close`](Self::close), but stops waiting as soon as `cancel`
    /// fires.  Sessions and streams are still told to stop; only the waits
    /// for them are cut short.
    pub async fn close_until(&self, cancel: CancellationToken) {
        {
            let mut state = lock(&self.state);
            match *state {
                LifecycleState::Closing | LifecycleState::Closed => {
                    debug!("close: already {:?}", *state);
                    return;
                }
                LifecycleState::Starting | LifecycleState::Running => {
                    *state = LifecycleState::Closing;
                }
            }
        }

        info!("telemock gateway on {} closing", self.local_addr);
        self.shutdown.cancel();
        let closed = tokio::select! {
            biased;
            closed = self.registry.close_all() => Some(closed),
            _ = cancel.cancelled() => None,
        };
        self.queue.close();

        let task = lock(&self.accept_task).take();
        if let Some(task) = task {
            tokio::select! {
                biased;
                joined = timeout(self.config.shutdown_timeout, task) => {
                    if joined.is_err() {
                        warn!(
                            "accept loop did not stop within {:?}; abandoning it",
                            self.config.shutdown_timeout
                        );
                    }
                }
                _ = cancel.cancelled() => warn!("close cancelled; not waiting for the accept loop"),
            }
        }

        *lock(&self.state) = LifecycleState::Closed;
        match closed {
            Some(closed) => info!("telemock gateway closed ({closed} session(s) disconnected)"),
            None => warn!("telemock gateway closed without waiting for sessions"),
        }
    }
}

impl Drop for Gateway {
    fn drop(&mut self) {
        self.shutdown.cancel();
        self.queue.close();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
