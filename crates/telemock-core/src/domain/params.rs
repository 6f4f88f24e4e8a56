//! Parameters of the send operation.

use serde::{Deserialize, Serialize};

use crate::domain::keyboard::InlineKeyboardMarkup;

/// Target chat of a send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId {
    pub id: i64,
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self { id }
    }
}

/// What the bot program asks the gateway to send.
///
/// # Example
///
/// ```rust
/// use telemock_core::{InlineKeyboardButton, InlineKeyboardMarkup, SendMessageParams};
///
/// let params = SendMessageParams::new(123_i64, "pick one")
///     .reply_to(42)
///     .with_keyboard(InlineKeyboardMarkup::default().row(vec![
///         InlineKeyboardButton::new("Yes", "y"),
///         InlineKeyboardButton::new("No", "n"),
///     ]));
/// assert_eq!(params.reply_target(), Some(42));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageParams {
    pub chat_id: ChatId,
    pub text: String,
    /// Message being replied to.  `None` and `Some(0)` both mean "not a reply".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl SendMessageParams {
    pub fn new(chat_id: impl Into<ChatId>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            text: text.into(),
            reply_to_message_id: None,
            reply_markup: None,
        }
    }

    pub fn reply_to(mut self, message_id: i64) -> Self {
        self.reply_to_message_id = Some(message_id);
        self
    }

    pub fn with_keyboard(mut self, markup: InlineKeyboardMarkup) -> Self {
        self.reply_markup = Some(markup);
        self
    }

    /// The reply target, if one was given and it is non-zero.
    pub fn reply_target(&self) -> Option<i64> {
        self.reply_to_message_id.filter(|&id| id != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_has_no_reply_target_or_keyboard() {
        let params = SendMessageParams::new(1_i64, "x");
        assert_eq!(params.chat_id, ChatId { id: 1 });
        assert_eq!(params.reply_target(), None);
        assert!(params.reply_markup.is_none());
    }

    #[test]
    fn test_zero_reply_target_is_not_a_reply() {
        let params = SendMessageParams::new(1_i64, "x").reply_to(0);
        assert_eq!(params.reply_target(), None);
    }

    #[test]
    fn test_non_zero_reply_target_is_kept() {
        let params = SendMessageParams::new(1_i64, "x").reply_to(-5);
        assert_eq!(params.reply_target(), Some(-5));
    }
}
