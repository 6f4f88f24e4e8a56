//! Application layer: pure use cases between the sessions and the bot.
//!
//! Nothing here touches sockets or the runtime, so both halves are unit
//! tested with plain `#[test]` functions.

pub mod dispatch;
pub mod reply;

pub use dispatch::{DispatchError, InboundDispatcher};
pub use reply::{prepare_reply, PreparedReply};
