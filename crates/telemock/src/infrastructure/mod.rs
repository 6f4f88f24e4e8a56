//! Infrastructure layer: sockets, tasks, and shared mutable state.
//!
//! - [`session`]: the `SessionSink` seam and its WebSocket implementation.
//! - [`registry`]: the live session set.
//! - [`update_queue`]: bounded drop-oldest buffer between sessions and bot.
//! - [`long_poll`]: cancellable stream over the queue.
//! - [`broadcast`]: fan-out of replies with per-session deadlines.
//! - [`ws_server`]: accept loop and per-session read tasks.

pub mod broadcast;
pub mod long_poll;
pub mod registry;
pub mod session;
pub mod update_queue;
pub mod ws_server;

pub use broadcast::{BroadcastReport, Broadcaster};
pub use long_poll::{spawn_long_poll, UpdateStream};
pub use registry::SessionRegistry;
pub use session::{SessionError, SessionHandle, SessionSink, WsSession};
pub use update_queue::{PushOutcome, UpdateQueue};
pub use ws_server::{run_accept_loop, SessionContext};
