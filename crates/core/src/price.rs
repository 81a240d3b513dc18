//! Price quote for the tracked pair.

use crate::BotError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A positive, finite quote.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Price(f64);

impl Price {
    /// Create a price, rejecting zero, negative and non-finite values.
    pub fn new(value: f64) -> Result<Self, BotError> {
        if value.is_finite() && value > 0.0 {
            Ok(Price(value))
        } else {
            Err(BotError::InvalidArgument(format!(
                "price must be a positive number, got {}",
                value
            )))
        }
    }

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Parse user input such as `104000` or `104000.5`.
    pub fn parse(input: &str) -> Result<Self, BotError> {
        let value = input
            .trim()
            .parse::<f64>()
            .map_err(|_| BotError::InvalidArgument(format!("'{}' is not a number", input.trim())))?;
        Self::new(value)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

/// A trading pair, e.g. `BTC/USDT`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pair {
    pub base: String,
    pub quote: String,
}

impl Pair {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into().to_uppercase(),
            quote: quote.into().to_uppercase(),
        }
    }

    /// Parse `BTC/USDT` or `BTC-USDT`.
    pub fn parse(input: &str) -> Option<Self> {
        let (base, quote) = input.trim().split_once(['/', '-'])?;
        if base.is_empty() || quote.is_empty() {
            return None;
        }
        Some(Self::new(base, quote))
    }

    /// Concatenated exchange symbol, e.g. `BTCUSDT`.
    pub fn symbol(&self) -> String {
        format!("{}{}", self.base, self.quote)
    }
}

impl Default for Pair {
    fn default() -> Self {
        Self::new("BTC", "USDT")
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}
