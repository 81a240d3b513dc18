//! Per-chat notification engine.
//!
//! This crate contains the chat state store, the recurring job scheduler,
//! one-shot alert evaluation and the rolling message retention, wired
//! together by [`PriceWatch`].

pub mod evaluator;
pub mod retention;
pub mod scheduler;
pub mod service;
pub mod store;
pub mod ticker;
pub mod transport;

#[cfg(test)]
mod mock;

pub use evaluator::{clear_fired, evaluate, evaluate_and_clear};
pub use retention::*;
pub use scheduler::*;
pub use service::*;
pub use store::*;
pub use ticker::*;
pub use transport::*;
