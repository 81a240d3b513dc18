//! Error taxonomy shared by every layer of the bot.

use crate::{ChatId, MessageId};
use thiserror::Error;

/// Errors produced while handling commands and ticks.
///
/// Only `InvalidArgument` and `NotStarted` are reported back to the chat;
/// the rest are logged and never interrupt other chats.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BotError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Chat {0} has not been started")]
    NotStarted(ChatId),

    #[error("Price fetch failed: {0}")]
    Fetch(String),

    #[error("Failed to send message: {0}")]
    Send(String),

    #[error("Failed to delete message {message_id}: {reason}")]
    Delete {
        message_id: MessageId,
        reason: String,
    },
}

impl BotError {
    /// Returns true if the error should be surfaced to the user as a
    /// corrective message.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, BotError::InvalidArgument(_) | BotError::NotStarted(_))
    }
}

/// Result type for bot operations.
pub type BotResult<T> = Result<T, BotError>;
