//! Reply path: turns `SendMessageParams` into the message returned to the bot
//! and the frame broadcast to sessions.

use telemock_core::{Chat, Message, OutboundFrame, SendMessageParams, User, SENDER_TAG};

/// A send that has been assigned its message id and encoded for the wire.
#[derive(Debug, Clone)]
pub struct PreparedReply {
    /// What `send_message` hands back to the bot.
    pub message: Message,
    /// The JSON text frame written to every session.
    pub payload: String,
}

/// Builds the sent message and its outbound frame.
///
/// # Errors
///
/// Returns the serializer error if the frame cannot be encoded.
pub fn prepare_reply(
    message_id: i64,
    params: &SendMessageParams,
) -> Result<PreparedReply, serde_json::Error> {
    let frame = OutboundFrame::for_send(message_id, params);
    let payload = serde_json::to_string(&frame)?;
    let message = Message {
        message_id,
        from: Some(User::named(0, SENDER_TAG)),
        chat: Chat {
            id: params.chat_id.id,
        },
        text: params.text.clone(),
        entities: Vec::new(),
    };
    Ok(PreparedReply { message, payload })
}
