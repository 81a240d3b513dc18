//! Background price logging.
//!
//! Polls the price source on a fixed period and logs the quote, independent
//! of any chat.

use pricewatch_feeds::PriceSource;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Run the price logger loop until the task is aborted.
pub async fn run_price_logger(source: Arc<dyn PriceSource>, period: Duration) {
    info!("Starting price logger (every {:?})", period);

    loop {
        let delay = match source.fetch_price().await {
            Ok(price) => {
                info!("Current {} price: {}", source.pair(), price);
                period
            }
            Err(e) => {
                warn!("Failed to fetch price: {}", e);
                e.suggested_retry_delay().unwrap_or(period).max(period)
            }
        };

        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pricewatch_core::{Pair, Price};
    use pricewatch_feeds::FeedError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        pair: Pair,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PriceSource for CountingSource {
        async fn fetch_price(&self) -> Result<Price, FeedError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call % 2 == 0 {
                Price::new(100.0).map_err(|_| FeedError::InvalidPrice(100.0))
            } else {
                Err(FeedError::Malformed("bad body".to_string()))
            }
        }

        fn pair(&self) -> &Pair {
            &self.pair
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_logger_survives_fetch_errors() {
        let source = Arc::new(CountingSource {
            pair: Pair::default(),
            calls: AtomicUsize::new(0),
        });
        let handle = tokio::spawn(run_price_logger(source.clone(), Duration::from_secs(5)));

        tokio::time::sleep(Duration::from_secs(12)).await;
        handle.abort();

        // Calls at t=0, 5 and 10.
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }
}
