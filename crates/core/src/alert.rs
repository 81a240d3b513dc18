//! One-shot price alert types.

use crate::{BotError, BotResult, ChatId, Price};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Side of a threshold an alert watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertDirection {
    /// Fires when the price rises strictly above the threshold.
    Above,
    /// Fires when the price falls strictly below the threshold.
    Below,
}

impl AlertDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertDirection::Above => "above",
            AlertDirection::Below => "below",
        }
    }

    /// Whether `price` crosses `threshold` on this side.
    #[inline]
    pub fn is_crossed(self, price: Price, threshold: Price) -> bool {
        match self {
            AlertDirection::Above => price.value() > threshold.value(),
            AlertDirection::Below => price.value() < threshold.value(),
        }
    }
}

impl FromStr for AlertDirection {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "arriba" | "above" | "up" => Ok(AlertDirection::Above),
            "abajo" | "below" | "down" => Ok(AlertDirection::Below),
            other => Err(BotError::InvalidArgument(format!(
                "unknown direction '{}', use 'arriba' or 'abajo'",
                other
            ))),
        }
    }
}

impl fmt::Display for AlertDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parse the arguments of an alert command: `<direction> <price>`.
pub fn parse_alert_args(args: &str) -> BotResult<(AlertDirection, Price)> {
    let mut parts = args.split_whitespace();
    let (Some(direction), Some(price), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(BotError::InvalidArgument(
            "expected '<arriba|abajo> <price>'".to_string(),
        ));
    };
    let direction = direction.parse::<AlertDirection>()?;
    let price = Price::parse(price)?;
    Ok((direction, price))
}

/// An alert that fired on a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertFired {
    pub chat_id: ChatId,
    pub direction: AlertDirection,
    /// Threshold that was armed (and must now be cleared).
    pub threshold: Price,
    /// Price observed on the tick.
    pub price: Price,
}
