//! Per-chat state store.
//!
//! The chat map and each chat's state are guarded separately: the
//! `DashMap` serializes adding and removing chats, while every chat's
//! `Mutex` serializes commands and ticks touching that chat. The map lock is
//! never held while waiting on a chat lock.

use crate::MessageLog;
use dashmap::DashMap;
use pricewatch_core::{AlertDirection, BotError, BotResult, ChatConfig, ChatId, MessageId, Price};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Mutable state of one chat.
#[derive(Debug)]
pub struct ChatState {
    pub config: ChatConfig,
    pub log: MessageLog,
    // Set once the chat is removed; holders of a stale slot must back off.
    closed: bool,
}

impl ChatState {
    fn new(config: ChatConfig, retention_cap: usize) -> Self {
        Self {
            config,
            log: MessageLog::new(retention_cap),
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

type ChatSlot = Arc<Mutex<ChatState>>;

/// Exclusive access to one chat's state.
pub type ChatGuard = OwnedMutexGuard<ChatState>;

/// Holds configuration and message history for every active chat.
#[derive(Debug)]
pub struct ChatStateStore {
    chats: DashMap<ChatId, ChatSlot>,
    retention_cap: usize,
}

impl ChatStateStore {
    pub fn new(retention_cap: usize) -> Self {
        Self {
            chats: DashMap::new(),
            retention_cap,
        }
    }

    /// Lock a chat, creating it with `defaults` if absent. Existing
    /// configuration is left untouched.
    pub async fn upsert(&self, chat_id: ChatId, defaults: ChatConfig) -> ChatGuard {
        loop {
            let slot = self
                .chats
                .entry(chat_id)
                .or_insert_with(|| {
                    Arc::new(Mutex::new(ChatState::new(
                        defaults.clone(),
                        self.retention_cap,
                    )))
                })
                .clone();

            let guard = slot.lock_owned().await;
            if !guard.closed {
                return guard;
            }
            // Lost a race with a removal; the map no longer points at this
            // slot, so the next pass creates a fresh one.
        }
    }

    /// Lock an existing chat. Returns `None` if it was never started or has
    /// been removed.
    pub async fn lock(&self, chat_id: ChatId) -> Option<ChatGuard> {
        let slot = self.chats.get(&chat_id).map(|entry| Arc::clone(entry.value()))?;
        let guard = slot.lock_owned().await;
        (!guard.closed).then_some(guard)
    }

    async fn lock_started(&self, chat_id: ChatId) -> BotResult<ChatGuard> {
        self.lock(chat_id).await.ok_or(BotError::NotStarted(chat_id))
    }

    /// Snapshot of a chat's configuration.
    pub async fn config(&self, chat_id: ChatId) -> Option<ChatConfig> {
        self.lock(chat_id).await.map(|chat| chat.config.clone())
    }

    pub async fn set_interval(&self, chat_id: ChatId, seconds: u64) -> BotResult<ChatConfig> {
        let mut chat = self.lock_started(chat_id).await?;
        chat.config.set_interval(seconds)?;
        Ok(chat.config.clone())
    }

    pub async fn set_alert(
        &self,
        chat_id: ChatId,
        direction: AlertDirection,
        price: Price,
    ) -> BotResult<()> {
        let mut chat = self.lock_started(chat_id).await?;
        chat.config.set_alert(direction, price);
        Ok(())
    }

    pub async fn clear_alert(
        &self,
        chat_id: ChatId,
        direction: AlertDirection,
    ) -> BotResult<Option<Price>> {
        let mut chat = self.lock_started(chat_id).await?;
        Ok(chat.config.clear_alert(direction))
    }

    /// Close a locked chat and drop it from the map. Returns the drained
    /// message log so the caller can purge it after releasing the lock.
    pub fn detach(&self, chat_id: ChatId, chat: &mut ChatGuard) -> Vec<MessageId> {
        chat.closed = true;
        let slot = OwnedMutexGuard::mutex(chat);
        self.chats
            .remove_if(&chat_id, |_, current| Arc::ptr_eq(current, slot));
        chat.log.drain()
    }

    /// Remove a chat's configuration and message log together.
    pub async fn remove(&self, chat_id: ChatId) -> Option<(ChatConfig, Vec<MessageId>)> {
        let mut chat = self.lock(chat_id).await?;
        let ids = self.detach(chat_id, &mut chat);
        Some((chat.config.clone(), ids))
    }

    pub fn contains(&self, chat_id: ChatId) -> bool {
        self.chats.contains_key(&chat_id)
    }

    pub fn chat_ids(&self) -> Vec<ChatId> {
        self.chats.iter().map(|entry| *entry.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.chats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chats.is_empty()
    }
}

impl Default for ChatStateStore {
    fn default() -> Self {
        Self::new(crate::DEFAULT_RETENTION_CAP)
    }
}
