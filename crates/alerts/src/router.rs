//! Inbound command dispatch.

use pricewatch_core::{
    parse_alert_args, parse_interval_minutes, AlertDirection, BotError, ChatConfig, ChatId, Price,
};
use pricewatch_engine::PriceWatch;
use std::sync::Arc;
use teloxide::utils::command::BotCommands;
use tracing::{debug, warn};

const INTERVAL_USAGE: &str =
    "❗ Please provide a valid number of minutes (at least 1). Example: /setinterval 5";
const ALERT_USAGE: &str =
    "❗ Wrong usage. Example: /alert arriba 106000 or /alert abajo 103000";
const NOT_STARTED: &str = "Send /start first to begin tracking the price.";

/// Bot commands.
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start receiving the price periodically")]
    Start,
    #[command(description = "Change the notification interval. Usage: /setinterval 5")]
    SetInterval(String),
    #[command(description = "Set a one-shot alert. Usage: /alert arriba 106000")]
    Alert(String),
    #[command(description = "Show the current interval and alerts")]
    Status,
    #[command(description = "Stop price updates and delete recent notifications")]
    Stop,
    #[command(description = "Show help")]
    Help,
}

/// Maps commands onto the price watch and renders the reply.
#[derive(Clone)]
pub struct CommandRouter {
    watch: Arc<PriceWatch>,
}

impl CommandRouter {
    pub fn new(watch: Arc<PriceWatch>) -> Self {
        Self { watch }
    }

    pub fn watch(&self) -> &Arc<PriceWatch> {
        &self.watch
    }

    /// Handle one command and return the text to reply with.
    pub async fn dispatch(&self, chat_id: ChatId, command: Command) -> String {
        debug!(chat_id = %chat_id, command = ?command, "Dispatching command");

        match command {
            Command::Start => {
                let config = self.watch.start(chat_id).await;
                format!(
                    "👋 Hi! I'm tracking the {} price for you. 🚀\n\n\
                     You'll get an update every {}.\n\n\
                     ⏱ /setinterval <minutes> changes the frequency. Example: /setinterval 5\n\
                     🔔 /alert <arriba|abajo> <price> notifies you once when the price crosses it. \
                     Example: /alert arriba 106000\n\
                     📋 /status shows your settings, /stop ends the updates.",
                    self.watch.pair(),
                    format_interval(config.interval_secs)
                )
            }

            Command::SetInterval(args) => {
                let result = match parse_interval_minutes(&args) {
                    Ok(seconds) => self.watch.set_interval(chat_id, seconds).await,
                    Err(e) => Err(e),
                };
                match result {
                    Ok(config) => format!(
                        "⏱ Notification interval updated to {}.",
                        format_interval(config.interval_secs)
                    ),
                    Err(e) => error_reply(chat_id, &e, INTERVAL_USAGE),
                }
            }

            Command::Alert(args) => {
                let result = match parse_alert_args(&args) {
                    Ok((direction, price)) => self
                        .watch
                        .set_alert(chat_id, direction, price)
                        .await
                        .map(|()| (direction, price)),
                    Err(e) => Err(e),
                };
                match result {
                    Ok((direction, price)) => format_alert_armed(direction, price),
                    Err(e) => error_reply(chat_id, &e, ALERT_USAGE),
                }
            }

            Command::Status => match self.watch.status(chat_id).await {
                Some(config) => format_status(&config),
                None => NOT_STARTED.to_string(),
            },

            Command::Stop => {
                self.watch.stop(chat_id).await;
                "🔴 Stopped. You will no longer receive price updates.".to_string()
            }

            Command::Help => Command::descriptions().to_string(),
        }
    }
}

fn error_reply(chat_id: ChatId, err: &BotError, usage: &str) -> String {
    match err {
        BotError::InvalidArgument(reason) => {
            debug!(chat_id = %chat_id, reason = %reason, "Rejected command arguments");
            usage.to_string()
        }
        BotError::NotStarted(_) => NOT_STARTED.to_string(),
        other => {
            warn!(chat_id = %chat_id, error = %other, "Command failed");
            "Something went wrong, please try again later.".to_string()
        }
    }
}

fn format_interval(seconds: u64) -> String {
    match seconds {
        60 => "1 minute".to_string(),
        s if s % 60 == 0 => format!("{} minutes", s / 60),
        1 => "1 second".to_string(),
        s => format!("{} seconds", s),
    }
}

fn format_alert_armed(direction: AlertDirection, price: Price) -> String {
    match direction {
        AlertDirection::Above => format!(
            "🔔 Alert set: I'll let you know if the price rises above {}.",
            price
        ),
        AlertDirection::Below => format!(
            "🔔 Alert set: I'll let you know if the price falls below {}.",
            price
        ),
    }
}

fn format_status(config: &ChatConfig) -> String {
    let armed = |price: Option<Price>| match price {
        Some(p) => p.to_string(),
        None => "not set".to_string(),
    };
    format!(
        "📋 Current settings\n\n\
         Interval: {}\n\
         Alert above: {}\n\
         Alert below: {}",
        format_interval(config.interval_secs),
        armed(config.alert_above),
        armed(config.alert_below)
    )
}
