//! # telemock
//!
//! A local WebSocket test double for a chat-bot long-polling API.
//!
//! A bot under test swaps its real API client for a [`Gateway`]: it receives
//! [`Update`]s through [`Gateway::updates_via_long_polling`] and replies with
//! [`Gateway::send_message`].  Test harnesses connect over WebSocket, inject
//! messages and button presses as JSON frames, and observe every reply the
//! bot sends.
//!
//! ```no_run
//! use telemock::{CancellationToken, Gateway, SendMessageParams};
//!
//! # async fn run() -> Result<(), telemock::GatewayError> {
//! let gateway = Gateway::new("test-token").await?;
//! let mut updates = gateway.updates_via_long_polling(CancellationToken::new());
//! while let Some(update) = updates.recv().await {
//!     if let Some(message) = update.as_message() {
//!         let reply = SendMessageParams::new(message.chat.id, format!("Echo: {}", message.text))
//!             .reply_to(message.message_id);
//!         gateway.send_message(&reply).await?;
//!     }
//! }
//! gateway.close().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Layers
//!
//! - [`domain`]: configuration and session identity.
//! - [`application`]: frame dispatch and reply preparation (pure).
//! - [`infrastructure`]: sockets, registry, queue, broadcast.

pub mod application;
pub mod domain;
pub mod error;
mod gateway;
pub mod infrastructure;

pub use domain::GatewayConfig;
pub use error::GatewayError;
pub use gateway::{Gateway, LifecycleState};
pub use infrastructure::UpdateStream;

pub use telemock_core::{
    CallbackQuery, Chat, ChatId, EntityKind, InlineKeyboardButton, InlineKeyboardMarkup, Message,
    MessageEntity, SendMessageParams, Update, UpdateKind, User,
};
pub use tokio_util::sync::CancellationToken;
