//! Update, message, and callback value types delivered to the bot program.
//!
//! These are the shapes a bot written against a real chat-bot API expects to
//! receive from long polling.  The gateway builds them once per inbound frame
//! and never mutates them afterwards; ownership moves from the update queue
//! to the consumer.
//!
//! # JSON shape
//!
//! ```json
//! {"update_id":7,"message":{"message_id":3,"from":{"id":777},"chat":{"id":777},
//!   "text":"/start now","entities":[{"type":"bot_command","offset":0,"length":6}]}}
//! {"update_id":8,"callback_query":{"id":"cb-1700000000000000000-10",
//!   "from":{"id":555},"message":{...},"data":"ok"}}
//! ```

use serde::{Deserialize, Serialize};

/// A chat, identified solely by its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// A user, with an optional display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl User {
    /// A user known only by id.
    pub fn new(id: i64) -> Self {
        Self { id, name: None }
    }

    /// A user with a display name.
    pub fn named(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
        }
    }
}

/// The kind of span an entity marks inside a message's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A `/command` token.
    BotCommand,
}

/// A typed span of a message's text.
///
/// `offset` and `length` are byte offsets into [`Message::text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntity {
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub offset: usize,
    pub length: usize,
}

impl MessageEntity {
    /// A `bot_command` entity covering `offset..offset + length`.
    pub fn bot_command(offset: usize, length: usize) -> Self {
        Self {
            kind: EntityKind::BotCommand,
            offset,
            length,
        }
    }

    /// Returns the slice of `text` this entity covers, or `None` if the span
    /// falls outside `text` or splits a UTF-8 character.
    pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.get(self.offset..self.offset.checked_add(self.length)?)
    }
}

/// A chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub text: String,
    /// Command entities, in text order.  Omitted from JSON when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<MessageEntity>,
}

impl Message {
    /// Returns the leading `/command` token, if the message starts with one.
    ///
    /// ```rust
    /// use telemock_core::{Chat, Message, MessageEntity};
    ///
    /// let msg = Message {
    ///     message_id: 1,
    ///     from: None,
    ///     chat: Chat { id: 7 },
    ///     text: "/start now".to_string(),
    ///     entities: vec![MessageEntity::bot_command(0, 6)],
    /// };
    /// assert_eq!(msg.command(), Some("/start"));
    /// ```
    pub fn command(&self) -> Option<&str> {
        self.entities
            .iter()
            .find(|e| e.kind == EntityKind::BotCommand && e.offset == 0)
            .and_then(|e| e.slice(&self.text))
    }
}

/// A press on an inline keyboard button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackQuery {
    /// Generated id of the form `cb-<unix-nanos>-<message-id>`.
    ///
    /// Uniqueness is best-effort: two presses carrying the same message id
    /// within one clock tick produce the same id.
    pub id: String,
    pub from: User,
    /// The message the pressed keyboard was attached to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    /// Opaque callback data of the pressed button.
    pub data: String,
}

/// The payload of an [`Update`]: exactly one of a message or a callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateKind {
    #[serde(rename = "message")]
    Message(Message),
    #[serde(rename = "callback_query")]
    CallbackQuery(CallbackQuery),
}

/// One normalized inbound event, ready for delivery to the bot program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    /// Process-wide, strictly increasing sequence number.
    pub update_id: i64,
    #[serde(flatten)]
    pub kind: UpdateKind,
}

impl Update {
    pub fn message(update_id: i64, message: Message) -> Self {
        Self {
            update_id,
            kind: UpdateKind::Message(message),
        }
    }

    pub fn callback_query(update_id: i64, query: CallbackQuery) -> Self {
        Self {
            update_id,
            kind: UpdateKind::CallbackQuery(query),
        }
    }

    /// The message carried by this update, if it is a message update.
    pub fn as_message(&self) -> Option<&Message> {
        match &self.kind {
            UpdateKind::Message(message) => Some(message),
            UpdateKind::CallbackQuery(_) => None,
        }
    }

    /// The callback carried by this update, if it is a callback update.
    pub fn as_callback_query(&self) -> Option<&CallbackQuery> {
        match &self.kind {
            UpdateKind::CallbackQuery(query) => Some(query),
            UpdateKind::Message(_) => None,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
