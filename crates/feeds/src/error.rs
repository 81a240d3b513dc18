//! Error types for price fetching.

use pricewatch_core::BotError;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while fetching a quote.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Quote service returned HTTP {0}")]
    Status(u16),

    #[error("Malformed quote response: {0}")]
    Malformed(String),

    #[error("Invalid price in response: {0}")]
    InvalidPrice(f64),

    #[error("Request timed out")]
    Timeout,
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FeedError::Timeout
        } else if let Some(status) = err.status() {
            FeedError::Status(status.as_u16())
        } else if err.is_decode() {
            FeedError::Malformed(err.to_string())
        } else {
            FeedError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::Malformed(err.to_string())
    }
}

impl From<FeedError> for BotError {
    fn from(err: FeedError) -> Self {
        BotError::Fetch(err.to_string())
    }
}

impl FeedError {
    /// Returns true if the next tick is likely to succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FeedError::Http(_) | FeedError::Timeout => true,
            FeedError::Status(code) => *code == 429 || *code >= 500,
            FeedError::Malformed(_) | FeedError::InvalidPrice(_) => false,
        }
    }

    /// Suggested pause before the background logger retries.
    pub fn suggested_retry_delay(&self) -> Option<Duration> {
        match self {
            FeedError::Status(429) => Some(Duration::from_secs(60)),
            FeedError::Http(_) | FeedError::Timeout => Some(Duration::from_secs(5)),
            FeedError::Status(code) if *code >= 500 => Some(Duration::from_secs(10)),
            _ => None,
        }
    }
}
