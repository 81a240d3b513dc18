//! Per-tick work: fetch, evaluate alerts, notify, retain.

use crate::{evaluator, ChatStateStore, ChatTransport, JobToken, MessageRetention, TickHandler};
use async_trait::async_trait;
use pricewatch_core::{AlertDirection, AlertFired, BotResult, ChatId, Pair, Price};
use pricewatch_feeds::PriceSource;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Tick handler shared by every chat's job.
pub struct PriceTicker {
    store: Arc<ChatStateStore>,
    source: Arc<dyn PriceSource>,
    transport: Arc<dyn ChatTransport>,
    retention: MessageRetention,
}

impl PriceTicker {
    pub fn new(
        store: Arc<ChatStateStore>,
        source: Arc<dyn PriceSource>,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        let retention = MessageRetention::new(Arc::clone(&transport));
        Self {
            store,
            source,
            transport,
            retention,
        }
    }

    pub fn pair(&self) -> &Pair {
        self.source.pair()
    }
}

#[async_trait]
impl TickHandler for PriceTicker {
    async fn on_tick(&self, chat_id: ChatId, job: JobToken) -> BotResult<()> {
        if job.is_cancelled() {
            return Ok(());
        }

        // The fetch runs outside the chat lock so a slow quote service never
        // holds up commands for the chat.
        let price = self.source.fetch_price().await?;

        let Some(mut chat) = self.store.lock(chat_id).await else {
            debug!(chat_id = %chat_id, "Tick for removed chat skipped");
            return Ok(());
        };
        if job.is_cancelled() {
            debug!(chat_id = %chat_id, job_id = job.id(), "Tick for replaced job skipped");
            return Ok(());
        }

        let fired = evaluator::evaluate_and_clear(chat_id, price, &mut chat.config);

        let text = format_price_message(self.pair(), price);
        let purge = match self.transport.send_message(chat_id, &text).await {
            Ok(message_id) => {
                chat.log.record(message_id);
                chat.log.drain_if_full()
            }
            Err(e) => {
                warn!(chat_id = %chat_id, error = %e, "Failed to send price notification");
                None
            }
        };

        for alert in &fired {
            info!(
                chat_id = %chat_id,
                direction = %alert.direction,
                threshold = alert.threshold.value(),
                price = price.value(),
                "Alert fired"
            );
            let text = format_alert_message(self.pair(), alert);
            if let Err(e) = self.transport.send_message(chat_id, &text).await {
                warn!(chat_id = %chat_id, error = %e, "Failed to send alert");
            }
        }

        drop(chat);

        if let Some(ids) = purge {
            self.retention.purge(chat_id, ids).await;
        }

        Ok(())
    }
}

/// Periodic price notification.
pub fn format_price_message(pair: &Pair, price: Price) -> String {
    format!("💰 Current {} price: {}", pair, price)
}

/// Notification for a fired one-shot alert.
pub fn format_alert_message(pair: &Pair, alert: &AlertFired) -> String {
    let movement = match alert.direction {
        AlertDirection::Above => "rose above",
        AlertDirection::Below => "fell below",
    };
    format!(
        "⚠️ {} {} your alert at {} (now {})",
        pair, movement, alert.threshold, alert.price
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{RecordingTransport, StaticPrice};
    use pretty_assertions::assert_eq;
    use pricewatch_core::{BotError, ChatConfig, MessageId};

    struct Fixture {
        store: Arc<ChatStateStore>,
        source: Arc<StaticPrice>,
        transport: Arc<RecordingTransport>,
        ticker: PriceTicker,
    }

    fn fixture(price: f64) -> Fixture {
        let store = Arc::new(ChatStateStore::new(10));
        let source = Arc::new(StaticPrice::new(price));
        let transport = Arc::new(RecordingTransport::default());
        let ticker = PriceTicker::new(store.clone(), source.clone(), transport.clone());
        Fixture {
            store,
            source,
            transport,
            ticker,
        }
    }

    fn live_token() -> JobToken {
        JobToken::new(0)
    }

    #[tokio::test]
    async fn test_tick_sends_price_and_records_it() {
        let f = fixture(50000.0);
        drop(f.store.upsert(ChatId(1), ChatConfig::default()).await);

        f.ticker.on_tick(ChatId(1), live_token()).await.unwrap();

        assert_eq!(
            f.transport.texts(ChatId(1)),
            vec!["💰 Current BTC/USDT price: $50000.00".to_string()]
        );
        let chat = f.store.lock(ChatId(1)).await.unwrap();
        assert_eq!(chat.log.ids(), &[MessageId(1)]);
    }

    #[tokio::test]
    async fn test_alert_fires_once_and_clears() {
        let f = fixture(50000.0);
        drop(f.store.upsert(ChatId(1), ChatConfig::default()).await);
        f.store
            .set_alert(ChatId(1), AlertDirection::Above, Price::new(49000.0).unwrap())
            .await
            .unwrap();

        f.ticker.on_tick(ChatId(1), live_token()).await.unwrap();
        f.ticker.on_tick(ChatId(1), live_token()).await.unwrap();

        let alerts: Vec<String> = f
            .transport
            .texts(ChatId(1))
            .into_iter()
            .filter(|t| t.starts_with("⚠️"))
            .collect();
        assert_eq!(
            alerts,
            vec!["⚠️ BTC/USDT rose above your alert at $49000.00 (now $50000.00)".to_string()]
        );
        assert_eq!(f.store.config(ChatId(1)).await.unwrap().alert_above, None);
    }

    #[tokio::test]
    async fn test_below_alert_waits_for_crossing() {
        let f = fixture(50000.0);
        drop(f.store.upsert(ChatId(1), ChatConfig::default()).await);
        f.store
            .set_alert(ChatId(1), AlertDirection::Below, Price::new(45000.0).unwrap())
            .await
            .unwrap();

        f.ticker.on_tick(ChatId(1), live_token()).await.unwrap();
        assert_eq!(f.transport.texts(ChatId(1)).len(), 1);

        f.source.set(44000.0);
        f.ticker.on_tick(ChatId(1), live_token()).await.unwrap();

        let texts = f.transport.texts(ChatId(1));
        assert_eq!(texts.len(), 3);
        assert_eq!(
            texts[2],
            "⚠️ BTC/USDT fell below your alert at $45000.00 (now $44000.00)"
        );
        // Alerts are not part of the retained notification log.
        let chat = f.store.lock(ChatId(1)).await.unwrap();
        assert_eq!(chat.log.ids(), &[MessageId(1), MessageId(2)]);
    }

    #[tokio::test]
    async fn test_fetch_error_sends_nothing() {
        let f = fixture(50000.0);
        drop(f.store.upsert(ChatId(1), ChatConfig::default()).await);
        f.source.fail();

        let result = f.ticker.on_tick(ChatId(1), live_token()).await;

        assert!(matches!(result, Err(BotError::Fetch(_))));
        assert!(f.transport.texts(ChatId(1)).is_empty());
    }

    #[tokio::test]
    async fn test_eleventh_notification_purges_log() {
        let f = fixture(50000.0);
        drop(f.store.upsert(ChatId(1), ChatConfig::default()).await);

        for _ in 0..11 {
            f.ticker.on_tick(ChatId(1), live_token()).await.unwrap();
        }

        let deleted: Vec<MessageId> = f.transport.deleted().into_iter().map(|(_, id)| id).collect();
        assert_eq!(deleted, (1..=11).map(MessageId).collect::<Vec<_>>());
        assert!(f.store.lock(ChatId(1)).await.unwrap().log.is_empty());

        f.ticker.on_tick(ChatId(1), live_token()).await.unwrap();
        assert_eq!(f.store.lock(ChatId(1)).await.unwrap().log.ids(), &[MessageId(12)]);
    }

    #[tokio::test]
    async fn test_delete_failure_does_not_abort_purge() {
        let f = fixture(50000.0);
        drop(f.store.upsert(ChatId(1), ChatConfig::default()).await);
        f.transport.fail_delete(MessageId(3));

        for _ in 0..11 {
            f.ticker.on_tick(ChatId(1), live_token()).await.unwrap();
        }

        assert_eq!(f.transport.deleted().len(), 10);
        assert!(f.store.lock(ChatId(1)).await.unwrap().log.is_empty());
    }

    #[tokio::test]
    async fn test_send_failure_still_clears_alert() {
        let f = fixture(40000.0);
        drop(f.store.upsert(ChatId(1), ChatConfig::default()).await);
        f.store
            .set_alert(ChatId(1), AlertDirection::Below, Price::new(45000.0).unwrap())
            .await
            .unwrap();
        f.transport.fail_sends();

        f.ticker.on_tick(ChatId(1), live_token()).await.unwrap();

        let chat = f.store.lock(ChatId(1)).await.unwrap();
        assert_eq!(chat.config.alert_below, None);
        assert!(chat.log.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_or_removed_tick_is_silent() {
        let f = fixture(50000.0);
        let token = JobToken::new(1);
        token.cancel();
        drop(f.store.upsert(ChatId(1), ChatConfig::default()).await);

        f.ticker.on_tick(ChatId(1), token).await.unwrap();
        f.ticker.on_tick(ChatId(2), live_token()).await.unwrap();

        assert!(f.transport.sent().is_empty());
    }
}
