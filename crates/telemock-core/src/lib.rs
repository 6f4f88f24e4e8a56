//! # telemock-core
//!
//! Shared value types for the telemock gateway: the loosely-typed wire
//! frames exchanged with test sessions, the identifier normalizer that turns
//! their identifier fields into canonical `i64` values, and the update data
//! model handed to the bot program under test.
//!
//! This crate does no I/O and has no async runtime dependency.
//!
//! # Architecture overview
//!
//! The gateway is a local stand-in for a chat-bot backend.  A test harness
//! connects over WebSocket and sends JSON frames; the gateway normalizes each
//! frame into an [`Update`] and hands it to the bot program; the bot replies
//! through `send_message`, and the reply is broadcast back to every session.
//!
//! - **`protocol`** – What travels over the wire.  Inbound and outbound frame
//!   records, the [`WireId`] tagged union for schema-less identifier fields,
//!   and the monotonic [`IdCounter`] used for update and message ids.
//!
//! - **`domain`** – What the bot program sees.  [`Update`], [`Message`],
//!   [`CallbackQuery`], inline keyboards, and the parameters of the send
//!   operation.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `telemock_core::Update` instead of `telemock_core::domain::update::Update`.
pub use domain::keyboard::{InlineKeyboardButton, InlineKeyboardMarkup};
pub use domain::params::{ChatId, SendMessageParams};
pub use domain::update::{
    CallbackQuery, Chat, EntityKind, Message, MessageEntity, Update, UpdateKind, User,
};
pub use protocol::frames::{FrameKind, InboundFrame, OutboundFrame, SENDER_TAG};
pub use protocol::ids::{IdError, WireId};
pub use protocol::sequence::IdCounter;
