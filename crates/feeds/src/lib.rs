//! Price sources for the tracked pair.
//!
//! ## Architecture
//!
//! - `source` - `PriceSource` trait and source selection
//! - `rest` - REST quote fetchers (Binance, CoinGecko)
//! - `error` - `FeedError`

pub mod error;
pub mod rest;
pub mod source;

pub use error::*;
pub use rest::*;
pub use source::*;
