//! Inline keyboard markup attached to outgoing messages.
//!
//! The gateway never interprets a keyboard; it relays the grid to every
//! session unchanged.  When the harness "presses" a button it sends back a
//! frame whose `callback_data` equals the button's data.

use serde::{Deserialize, Serialize};

/// A grid of buttons: an ordered list of rows, each an ordered list of
/// buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

/// One button: display text plus opaque callback data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineKeyboardButton {
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

impl InlineKeyboardMarkup {
    pub fn new(rows: Vec<Vec<InlineKeyboardButton>>) -> Self {
        Self {
            inline_keyboard: rows,
        }
    }

    /// Appends a row and returns the markup, for builder-style construction.
    pub fn row(mut self, buttons: Vec<InlineKeyboardButton>) -> Self {
        self.inline_keyboard.push(buttons);
        self
    }

    /// Total number of buttons across all rows.
    pub fn button_count(&self) -> usize {
        self.inline_keyboard.iter().map(Vec::len).sum()
    }
}
