//! Price source abstraction.

use crate::{BinanceRestSource, CoinGeckoRestSource, FeedError};
use async_trait::async_trait;
use pricewatch_core::{Pair, Price};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Fetches the current quote for a fixed pair.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetch a fresh quote. Never cached across calls.
    async fn fetch_price(&self) -> Result<Price, FeedError>;

    /// Pair this source quotes.
    fn pair(&self) -> &Pair;
}

/// Available quote services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PriceSourceKind {
    #[default]
    Binance,
    CoinGecko,
}

impl PriceSourceKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "binance" => Some(PriceSourceKind::Binance),
            "coingecko" | "gecko" => Some(PriceSourceKind::CoinGecko),
            _ => None,
        }
    }
}

/// Build the configured price source.
pub fn build_price_source(
    kind: PriceSourceKind,
    pair: Pair,
    timeout: Duration,
) -> Result<Arc<dyn PriceSource>, FeedError> {
    let source: Arc<dyn PriceSource> = match kind {
        PriceSourceKind::Binance => Arc::new(BinanceRestSource::new(pair, timeout)?),
        PriceSourceKind::CoinGecko => Arc::new(CoinGeckoRestSource::new(pair, timeout)?),
    };
    Ok(source)
}

/// Validate a raw quote extracted from a response.
pub(crate) fn validate_price(value: f64) -> Result<Price, FeedError> {
    Price::new(value).map_err(|_| FeedError::InvalidPrice(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_parse() {
        assert_eq!(PriceSourceKind::parse("Binance"), Some(PriceSourceKind::Binance));
        assert_eq!(PriceSourceKind::parse("coingecko"), Some(PriceSourceKind::CoinGecko));
        assert_eq!(PriceSourceKind::parse("kraken"), None);
    }

    #[test]
    fn test_source_kind_serde() {
        let kind: PriceSourceKind = serde_json::from_str("\"coingecko\"").unwrap();
        assert_eq!(kind, PriceSourceKind::CoinGecko);
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price(42.0).is_ok());
        assert!(matches!(validate_price(0.0), Err(FeedError::InvalidPrice(_))));
    }

    #[test]
    fn test_build_price_source() {
        let source =
            build_price_source(PriceSourceKind::Binance, Pair::default(), Duration::from_secs(5))
                .unwrap();
        assert_eq!(source.pair().symbol(), "BTCUSDT");
    }
}
