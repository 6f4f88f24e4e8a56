//! Domain layer: the values the bot program receives and sends.
//!
//! Everything here is plain data with serde derives.  No I/O, no async, no
//! knowledge of sessions or queues.

pub mod keyboard;
pub mod params;
pub mod update;

pub use keyboard::{InlineKeyboardButton, InlineKeyboardMarkup};
pub use params::{ChatId, SendMessageParams};
pub use update::{CallbackQuery, Chat, EntityKind, Message, MessageEntity, Update, UpdateKind, User};
