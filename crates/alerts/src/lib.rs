//! Telegram front end for the price watch.
//!
//! This crate provides:
//! - Command parsing and dispatch onto the engine
//! - Telegram transport for notifications and purges

pub mod router;
pub mod telegram;

pub use router::{Command, CommandRouter};
pub use telegram::{TelegramBot, TelegramError, TelegramTransport};
