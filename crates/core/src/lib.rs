//! Core data types for the price watch bot.

pub mod alert;
pub mod chat;
pub mod config;
pub mod error;
pub mod price;

pub use alert::*;
pub use chat::*;
pub use config::*;
pub use error::*;
pub use price::*;
