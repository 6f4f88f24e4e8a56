//! JSON frame records exchanged with test sessions.
//!
//! # Message flow
//!
//! ```text
//! Session → Gateway:  JSON text frame  →  InboundFrame   →  Update
//! Gateway → Session:  SendMessageParams →  OutboundFrame  →  JSON text frame
//! ```
//!
//! Inbound frames are loosely typed: identifier fields may be numbers or
//! numeric strings (see [`WireId`]), and every field except `chat_id` may be
//! omitted.  Outbound frames always carry canonical integer identifiers.
//!
//! ```json
//! {"chat_id": "123", "text": "Hello", "message_id": 1}
//! {"chat_id": 555, "message_id": 10, "text": "btn", "callback_data": "ok"}
//! {"chat_id": 123, "text": "Hello", "from": "bot", "message_id": 4,
//!  "reply_to_message_id": 42, "is_reply": true}
//! ```

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::keyboard::InlineKeyboardMarkup;
use crate::domain::params::SendMessageParams;
use crate::protocol::ids::WireId;

/// Sender tag stamped on every outbound frame, marking the gateway (the bot)
/// as its origin.
pub const SENDER_TAG: &str = "bot";

// ── Session → Gateway ─────────────────────────────────────────────────────────

/// A frame received from a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InboundFrame {
    #[serde(default)]
    pub chat_id: WireId,
    #[serde(
        default,
        deserialize_with = "string_or_null",
        skip_serializing_if = "String::is_empty"
    )]
    pub text: String,
    #[serde(default, skip_serializing_if = "WireId::is_absent")]
    pub message_id: WireId,
    #[serde(
        default,
        deserialize_with = "string_or_null",
        skip_serializing_if = "String::is_empty"
    )]
    pub callback_data: String,
}

/// How an inbound frame is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Non-empty `callback_data`: a keyboard button press.
    Callback,
    /// Non-empty `text` and no callback data: a chat message.
    Message,
    /// Neither: a heartbeat or empty frame, ignored without error.
    Empty,
}

impl InboundFrame {
    /// Classifies the frame.  Callback data takes precedence over text.
    pub fn kind(&self) -> FrameKind {
        if !self.callback_data.is_empty() {
            FrameKind::Callback
        } else if !self.text.is_empty() {
            FrameKind::Message
        } else {
            FrameKind::Empty
        }
    }
}

/// `null` string fields are treated like absent ones.
fn string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// ── Gateway → Session ─────────────────────────────────────────────────────────

/// A reply broadcast to every session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundFrame {
    pub chat_id: i64,
    pub text: String,
    /// Always [`SENDER_TAG`].
    pub from: String,
    pub message_id: i64,
    /// Present only when the send named a non-zero reply target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
    /// Present (and `true`) only when `reply_to_message_id` is present.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_reply: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl OutboundFrame {
    /// Builds the frame announcing a sent message with id `message_id`.
    pub fn for_send(message_id: i64, params: &SendMessageParams) -> Self {
        let reply_to_message_id = params.reply_target();
        Self {
            chat_id: params.chat_id.id,
            text: params.text.clone(),
            from: SENDER_TAG.to_string(),
            message_id,
            reply_to_message_id,
            is_reply: reply_to_message_id.is_some(),
            reply_markup: params.reply_markup.clone(),
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

// ── Tests ─────────────────────────────────────────────────────────────────────
