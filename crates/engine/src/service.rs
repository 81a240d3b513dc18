//! Chat lifecycle: start, reconfigure, stop.
//!
//! Every operation that touches both a chat's configuration and its job runs
//! while holding that chat's lock, so ticks and commands for one chat are
//! strictly ordered.

use crate::{
    ChatStateStore, ChatTransport, MessageRetention, NotificationScheduler, PriceTicker,
    PurgeReport, DEFAULT_RETENTION_CAP,
};
use pricewatch_core::{
    AlertDirection, BotError, BotResult, ChatConfig, ChatId, Pair, Price, DEFAULT_INTERVAL_SECS,
};
use pricewatch_feeds::PriceSource;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Engine settings.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Interval installed by `start` for a new chat.
    pub default_interval: Duration,
    /// Notifications kept per chat before a purge.
    pub retention_cap: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            retention_cap: DEFAULT_RETENTION_CAP,
        }
    }
}

/// Price watch service shared by all chats.
pub struct PriceWatch {
    config: EngineConfig,
    store: Arc<ChatStateStore>,
    scheduler: NotificationScheduler,
    ticker: Arc<PriceTicker>,
    retention: MessageRetention,
}

impl PriceWatch {
    pub fn new(
        config: EngineConfig,
        source: Arc<dyn PriceSource>,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        let store = Arc::new(ChatStateStore::new(config.retention_cap));
        let ticker = Arc::new(PriceTicker::new(
            Arc::clone(&store),
            source,
            Arc::clone(&transport),
        ));
        Self {
            config,
            store,
            scheduler: NotificationScheduler::new(),
            ticker,
            retention: MessageRetention::new(transport),
        }
    }

    pub fn pair(&self) -> &Pair {
        self.ticker.pair()
    }

    fn default_chat_config(&self) -> ChatConfig {
        ChatConfig {
            interval_secs: self.config.default_interval.as_secs().max(1),
            ..Default::default()
        }
    }

    /// Activate a chat and (re)install its job. An already active chat
    /// keeps its configuration.
    pub async fn start(&self, chat_id: ChatId) -> ChatConfig {
        let chat = self.store.upsert(chat_id, self.default_chat_config()).await;
        self.scheduler
            .install(chat_id, chat.config.interval(), self.ticker.clone());
        info!(chat_id = %chat_id, interval_secs = chat.config.interval_secs, "Chat started");
        chat.config.clone()
    }

    /// Change the chat's interval and replace its job.
    pub async fn set_interval(&self, chat_id: ChatId, seconds: u64) -> BotResult<ChatConfig> {
        let mut chat = self
            .store
            .lock(chat_id)
            .await
            .ok_or(BotError::NotStarted(chat_id))?;
        chat.config.set_interval(seconds)?;
        self.scheduler
            .install(chat_id, chat.config.interval(), self.ticker.clone());
        info!(chat_id = %chat_id, interval_secs = seconds, "Interval changed");
        Ok(chat.config.clone())
    }

    /// Arm a one-shot alert.
    pub async fn set_alert(
        &self,
        chat_id: ChatId,
        direction: AlertDirection,
        price: Price,
    ) -> BotResult<()> {
        self.store.set_alert(chat_id, direction, price).await?;
        info!(chat_id = %chat_id, direction = %direction, threshold = price.value(), "Alert armed");
        Ok(())
    }

    /// Cancel the chat's job, tear down its state and purge retained
    /// messages. Safe to call for a chat that is not active.
    pub async fn stop(&self, chat_id: ChatId) -> PurgeReport {
        let Some(mut chat) = self.store.lock(chat_id).await else {
            self.scheduler.cancel(chat_id);
            return PurgeReport::default();
        };

        self.scheduler.cancel(chat_id);
        let ids = self.store.detach(chat_id, &mut chat);
        drop(chat);

        let report = self.retention.purge(chat_id, ids).await;
        info!(chat_id = %chat_id, purged = report.deleted, "Chat stopped");
        report
    }

    /// Current configuration of an active chat.
    pub async fn status(&self, chat_id: ChatId) -> Option<ChatConfig> {
        self.store.config(chat_id).await
    }

    pub fn is_active(&self, chat_id: ChatId) -> bool {
        self.scheduler.is_active(chat_id)
    }

    pub fn active_chats(&self) -> usize {
        self.scheduler.active_jobs()
    }

    /// Cancel every job. Chat state is left in place.
    pub fn shutdown(&self) -> usize {
        let cancelled = self.scheduler.cancel_all();
        info!(cancelled, "Cancelled all notification jobs");
        cancelled
    }
}
