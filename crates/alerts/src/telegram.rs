//! Telegram bot handlers and transport.

use crate::router::{Command, CommandRouter};
use async_trait::async_trait;
use pricewatch_core::{BotError, BotResult, ChatId, MessageId};
use pricewatch_engine::ChatTransport;
use std::sync::Arc;
use teloxide::prelude::*;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("Telegram API error: {0}")]
    Api(#[from] teloxide::RequestError),
}

fn telegram_chat(chat_id: ChatId) -> teloxide::types::ChatId {
    teloxide::types::ChatId(chat_id.0)
}

/// Sends and deletes notifications through the Bot API.
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_message(&self, chat_id: ChatId, text: &str) -> BotResult<MessageId> {
        let message = self
            .bot
            .send_message(telegram_chat(chat_id), text)
            .await
            .map_err(|e| BotError::Send(e.to_string()))?;
        Ok(MessageId(message.id.0))
    }

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> BotResult<()> {
        self.bot
            .delete_message(telegram_chat(chat_id), teloxide::types::MessageId(message_id.0))
            .await
            .map_err(|e| BotError::Delete {
                message_id,
                reason: e.to_string(),
            })?;
        Ok(())
    }
}

/// Telegram bot wrapper.
pub struct TelegramBot {
    bot: Bot,
    router: CommandRouter,
}

impl TelegramBot {
    /// Create a bot that answers commands through `router`.
    pub fn new(bot: Bot, router: CommandRouter) -> Self {
        Self { bot, router }
    }

    /// Get the underlying bot.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    /// Run the command handler until Ctrl+C.
    pub async fn run(self: Arc<Self>) {
        let bot = self.bot.clone();
        let handler = Update::filter_message().filter_command::<Command>().endpoint(
            move |bot: Bot, msg: Message, cmd: Command| {
                let this = Arc::clone(&self);
                async move { this.handle_command(bot, msg, cmd).await }
            },
        );

        info!("Telegram command handler running");

        Dispatcher::builder(bot, handler)
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }

    async fn handle_command(
        &self,
        bot: Bot,
        msg: Message,
        cmd: Command,
    ) -> Result<(), TelegramError> {
        let chat_id = ChatId(msg.chat.id.0);
        let reply = self.router.dispatch(chat_id, cmd).await;
        bot.send_message(msg.chat.id, reply).await?;
        Ok(())
    }
}
