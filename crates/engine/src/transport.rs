//! Outbound chat transport.

use async_trait::async_trait;
use pricewatch_core::{BotResult, ChatId, MessageId};

/// Sends and deletes messages in a chat.
///
/// Implementations map their failures to `BotError::Send` and
/// `BotError::Delete`.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a text message, returning the identifier assigned by the transport.
    async fn send_message(&self, chat_id: ChatId, text: &str) -> BotResult<MessageId>;

    /// Delete a previously sent message.
    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> BotResult<()>;
}
