//! Per-chat notification configuration.

use crate::{AlertDirection, BotError, BotResult, Price};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Interval applied to a chat on `start`.
pub const DEFAULT_INTERVAL_SECS: u64 = 60;

/// Configuration of one chat's recurring notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Seconds between two ticks (always >= 1).
    pub interval_secs: u64,
    /// One-shot threshold watched from below.
    pub alert_above: Option<Price>,
    /// One-shot threshold watched from above.
    pub alert_below: Option<Price>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
            alert_above: None,
            alert_below: None,
        }
    }
}

impl ChatConfig {
    /// Create a config with the given interval and no alerts.
    pub fn with_interval(interval_secs: u64) -> BotResult<Self> {
        let mut config = Self::default();
        config.set_interval(interval_secs)?;
        Ok(config)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn set_interval(&mut self, seconds: u64) -> BotResult<()> {
        if seconds < 1 {
            return Err(BotError::InvalidArgument(
                "interval must be at least 1 second".to_string(),
            ));
        }
        self.interval_secs = seconds;
        Ok(())
    }

    pub fn alert(&self, direction: AlertDirection) -> Option<Price> {
        match direction {
            AlertDirection::Above => self.alert_above,
            AlertDirection::Below => self.alert_below,
        }
    }

    pub fn set_alert(&mut self, direction: AlertDirection, price: Price) {
        match direction {
            AlertDirection::Above => self.alert_above = Some(price),
            AlertDirection::Below => self.alert_below = Some(price),
        }
    }

    /// Disarm a threshold, returning the value it held.
    pub fn clear_alert(&mut self, direction: AlertDirection) -> Option<Price> {
        match direction {
            AlertDirection::Above => self.alert_above.take(),
            AlertDirection::Below => self.alert_below.take(),
        }
    }
}

/// Parse the argument of an interval command, given in whole minutes,
/// and return it in seconds.
pub fn parse_interval_minutes(args: &str) -> BotResult<u64> {
    let minutes = args.trim().parse::<u64>().map_err(|_| {
        BotError::InvalidArgument(format!("'{}' is not a whole number of minutes", args.trim()))
    })?;
    if minutes < 1 {
        return Err(BotError::InvalidArgument(
            "interval must be at least 1 minute".to_string(),
        ));
    }
    minutes
        .checked_mul(60)
        .ok_or_else(|| BotError::InvalidArgument("interval is too large".to_string()))
}
