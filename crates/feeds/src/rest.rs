//! REST quote fetchers.
//!
//! Each tick asks the quote service for a fresh ticker price; nothing is
//! cached between calls.

use crate::source::validate_price;
use crate::{FeedError, PriceSource};
use async_trait::async_trait;
use pricewatch_core::{Pair, Price};
use std::time::Duration;
use tracing::debug;

fn http_client(timeout: Duration) -> Result<reqwest::Client, FeedError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

async fn get_json(client: &reqwest::Client, url: &str) -> Result<serde_json::Value, FeedError> {
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(FeedError::Status(response.status().as_u16()));
    }

    Ok(response.json().await?)
}

/// Binance spot ticker price.
pub struct BinanceRestSource {
    client: reqwest::Client,
    pair: Pair,
    url: String,
}

impl BinanceRestSource {
    const BASE_URL: &'static str = "https://api.binance.com";

    pub fn new(pair: Pair, timeout: Duration) -> Result<Self, FeedError> {
        let url = format!(
            "{}/api/v3/ticker/price?symbol={}",
            Self::BASE_URL,
            pair.symbol()
        );
        Ok(Self {
            client: http_client(timeout)?,
            pair,
            url,
        })
    }

    /// Parse `{"symbol":"BTCUSDT","price":"104235.12000000"}`.
    pub fn parse_ticker(json: &serde_json::Value) -> Result<Price, FeedError> {
        let raw = &json["price"];
        let value = match (raw.as_str(), raw.as_f64()) {
            (Some(s), _) => s
                .parse::<f64>()
                .map_err(|_| FeedError::Malformed(format!("price is not numeric: {}", s)))?,
            (None, Some(v)) => v,
            (None, None) => {
                return Err(FeedError::Malformed("missing 'price' field".to_string()));
            }
        };
        validate_price(value)
    }
}

#[async_trait]
impl PriceSource for BinanceRestSource {
    async fn fetch_price(&self) -> Result<Price, FeedError> {
        let json = get_json(&self.client, &self.url).await?;
        let price = Self::parse_ticker(&json)?;
        debug!(pair = %self.pair, price = price.value(), "Binance: fetched price");
        Ok(price)
    }

    fn pair(&self) -> &Pair {
        &self.pair
    }
}

/// CoinGecko simple price.
pub struct CoinGeckoRestSource {
    client: reqwest::Client,
    pair: Pair,
    coin_id: String,
    vs_currency: String,
    url: String,
}

impl CoinGeckoRestSource {
    const BASE_URL: &'static str = "https://api.coingecko.com";

    pub fn new(pair: Pair, timeout: Duration) -> Result<Self, FeedError> {
        let coin_id = Self::coin_id(&pair.base);
        let vs_currency = Self::vs_currency(&pair.quote);
        let url = format!(
            "{}/api/v3/simple/price?ids={}&vs_currencies={}",
            Self::BASE_URL,
            coin_id,
            vs_currency
        );
        Ok(Self {
            client: http_client(timeout)?,
            pair,
            coin_id,
            vs_currency,
            url,
        })
    }

    /// CoinGecko coin id for a ticker symbol.
    fn coin_id(base: &str) -> String {
        match base {
            "BTC" => "bitcoin".to_string(),
            "ETH" => "ethereum".to_string(),
            "SOL" => "solana".to_string(),
            "XRP" => "ripple".to_string(),
            "DOGE" => "dogecoin".to_string(),
            other => other.to_lowercase(),
        }
    }

    // Stablecoin quotes are priced in USD.
    fn vs_currency(quote: &str) -> String {
        match quote {
            "USDT" | "USDC" | "USD" => "usd".to_string(),
            other => other.to_lowercase(),
        }
    }

    /// Parse `{"bitcoin":{"usd":104235}}`.
    pub fn parse_simple_price(
        json: &serde_json::Value,
        coin_id: &str,
        vs_currency: &str,
    ) -> Result<Price, FeedError> {
        let value = json[coin_id][vs_currency].as_f64().ok_or_else(|| {
            FeedError::Malformed(format!("missing '{}.{}' field", coin_id, vs_currency))
        })?;
        validate_price(value)
    }
}

#[async_trait]
impl PriceSource for CoinGeckoRestSource {
    async fn fetch_price(&self) -> Result<Price, FeedError> {
        let json = get_json(&self.client, &self.url).await?;
        let price = Self::parse_simple_price(&json, &self.coin_id, &self.vs_currency)?;
        debug!(pair = %self.pair, price = price.value(), "CoinGecko: fetched price");
        Ok(price)
    }

    fn pair(&self) -> &Pair {
        &self.pair
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_binance_parse_ticker() {
        let json = json!({"symbol": "BTCUSDT", "price": "104235.12000000"});
        let price = BinanceRestSource::parse_ticker(&json).unwrap();
        assert!((price.value() - 104235.12).abs() < 1e-9);
    }

    #[test]
    fn test_binance_parse_errors() {
        let missing = json!({"symbol": "BTCUSDT"});
        assert!(matches!(
            BinanceRestSource::parse_ticker(&missing),
            Err(FeedError::Malformed(_))
        ));

        let garbage = json!({"price": "n/a"});
        assert!(matches!(
            BinanceRestSource::parse_ticker(&garbage),
            Err(FeedError::Malformed(_))
        ));

        let zero = json!({"price": "0.00000000"});
        assert!(matches!(
            BinanceRestSource::parse_ticker(&zero),
            Err(FeedError::InvalidPrice(_))
        ));
    }

    #[test]
    fn test_coingecko_parse_simple_price() {
        let json = json!({"bitcoin": {"usd": 104235}});
        let price = CoinGeckoRestSource::parse_simple_price(&json, "bitcoin", "usd").unwrap();
        assert_eq!(price.value(), 104235.0);

        let wrong = json!({"ethereum": {"usd": 3000.5}});
        assert!(CoinGeckoRestSource::parse_simple_price(&wrong, "bitcoin", "usd").is_err());
    }

    #[test]
    fn test_urls() {
        let binance = BinanceRestSource::new(Pair::default(), Duration::from_secs(5)).unwrap();
        assert_eq!(
            binance.url,
            "https://api.binance.com/api/v3/ticker/price?symbol=BTCUSDT"
        );

        let gecko = CoinGeckoRestSource::new(Pair::default(), Duration::from_secs(5)).unwrap();
        assert_eq!(
            gecko.url,
            "https://api.coingecko.com/api/v3/simple/price?ids=bitcoin&vs_currencies=usd"
        );
    }
}
