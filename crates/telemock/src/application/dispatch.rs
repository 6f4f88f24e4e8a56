//! Inbound pipeline: turns one raw session frame into an update payload.
//!
//! The dispatcher is synchronous and owns no I/O.  The session read task
//! calls [`InboundDispatcher::dispatch`] for every text frame and pushes the
//! result into the update queue, which stamps the `update_id`.
//!
//! Classification:
//!
//! | Frame                         | Result                         |
//! |-------------------------------|--------------------------------|
//! | non-empty `callback_data`     | `UpdateKind::CallbackQuery`    |
//! | non-empty `text`, no callback | `UpdateKind::Message`          |
//! | neither                       | `None` (heartbeat, ignored)    |
//! | not a JSON object             | `DispatchError::MalformedFrame`|
//!
//! A missing or non-numeric `chat_id` does not reject the frame: the update is
//! built for chat 0 and a warning is logged.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use telemock_core::{
    CallbackQuery, Chat, FrameKind, IdCounter, InboundFrame, Message, MessageEntity, UpdateKind,
    User,
};
use thiserror::Error;
use tracing::warn;

/// Why an inbound frame produced no update.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("malformed frame: {0}")]
    MalformedFrame(#[from] serde_json::Error),
}

/// Converts raw frames into update payloads.
///
/// Shares its message-id counter with the reply path, so a fallback id for an
/// inbound message and the id of a sent message never collide.
#[derive(Debug, Clone)]
pub struct InboundDispatcher {
    message_ids: Arc<IdCounter>,
}

impl InboundDispatcher {
    pub fn new(message_ids: Arc<IdCounter>) -> Self {
        Self { message_ids }
    }

    /// Parses `raw` and builds the update payload it describes.
    ///
    /// # Errors
    ///
    /// [`DispatchError::MalformedFrame`] when `raw` is not a frame object.
    pub fn dispatch(&self, raw: &str) -> Result<Option<UpdateKind>, DispatchError> {
        let frame: InboundFrame = serde_json::from_str(raw)?;
        self.dispatch_frame(frame)
    }

    /// Same as [`dispatch`](Self::dispatch) for an already parsed frame.
    pub fn dispatch_frame(&self, frame: InboundFrame) -> Result<Option<UpdateKind>, DispatchError> {
        let kind = frame.kind();
        if kind == FrameKind::Empty {
            return Ok(None);
        }

        let chat_id = frame.chat_id.to_id().unwrap_or_else(|e| {
            warn!("unusable chat_id ({e}); delivering to chat 0");
            0
        });
        let update = match kind {
            FrameKind::Callback => UpdateKind::CallbackQuery(callback_query(chat_id, frame)),
            _ => UpdateKind::Message(self.message(chat_id, frame)),
        };
        Ok(Some(update))
    }

    fn message(&self, chat_id: i64, frame: InboundFrame) -> Message {
        let mut message_id = frame.message_id.to_id_or_zero();
        if message_id == 0 {
            message_id = self.message_ids.next();
        }
        let entities = command_entity(&frame.text).into_iter().collect();
        Message {
            message_id,
            from: Some(User::new(chat_id)),
            chat: Chat { id: chat_id },
            text: frame.text,
            entities,
        }
    }
}

/// A button press: the originating message keeps whatever id the session
/// sent (0 when absent) so harnesses can correlate it with an earlier reply.
fn callback_query(chat_id: i64, frame: InboundFrame) -> CallbackQuery {
    let message_id = frame.message_id.to_id_or_zero();
    CallbackQuery {
        id: callback_id(message_id),
        from: User::new(chat_id),
        message: Some(Message {
            message_id,
            from: Some(User::new(chat_id)),
            chat: Chat { id: chat_id },
            text: frame.text,
            entities: Vec::new(),
        }),
        data: frame.callback_data,
    }
}

/// `cb-<unix nanos>-<message id>`.  Unique in practice, not guaranteed.
fn callback_id(message_id: i64) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("cb-{nanos}-{message_id}")
}

/// A leading `/word` becomes a `bot_command` entity covering the word.
///
/// Offsets are byte offsets into the UTF-8 text.  A bare `/` is not a command.
pub fn command_entity(text: &str) -> Option<MessageEntity> {
    if !text.starts_with('/') {
        return None;
    }
    let end = text.find(char::is_whitespace).unwrap_or(text.len());
    (end > 1).then(|| MessageEntity::bot_command(0, end))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
