//! In-memory transport and price source for tests.

use crate::ChatTransport;
use async_trait::async_trait;
use pricewatch_core::{BotError, BotResult, ChatId, MessageId, Pair, Price};
use pricewatch_feeds::{FeedError, PriceSource};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::Mutex;

pub struct RecordingTransport {
    next_id: AtomicI32,
    sent: Mutex<Vec<(ChatId, MessageId, String)>>,
    deleted: Mutex<Vec<(ChatId, MessageId)>>,
    failing_deletes: Mutex<HashSet<MessageId>>,
    fail_sends: AtomicBool,
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self {
            next_id: AtomicI32::new(1),
            sent: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            failing_deletes: Mutex::new(HashSet::new()),
            fail_sends: AtomicBool::new(false),
        }
    }
}

impl RecordingTransport {
    pub fn sent(&self) -> Vec<(ChatId, MessageId, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self, chat_id: ChatId) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(chat, _, _)| *chat == chat_id)
            .map(|(_, _, text)| text)
            .collect()
    }

    pub fn deleted(&self) -> Vec<(ChatId, MessageId)> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn fail_delete(&self, message_id: MessageId) {
        self.failing_deletes.lock().unwrap().insert(message_id);
    }

    pub fn fail_sends(&self) {
        self.fail_sends.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_message(&self, chat_id: ChatId, text: &str) -> BotResult<MessageId> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(BotError::Send("chat unreachable".into()));
        }
        let message_id = MessageId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.sent
            .lock()
            .unwrap()
            .push((chat_id, message_id, text.to_string()));
        Ok(message_id)
    }

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> BotResult<()> {
        if self.failing_deletes.lock().unwrap().contains(&message_id) {
            return Err(BotError::Delete {
                message_id,
                reason: "message to delete not found".into(),
            });
        }
        self.deleted.lock().unwrap().push((chat_id, message_id));
        Ok(())
    }
}

pub struct StaticPrice {
    pair: Pair,
    price: Mutex<Option<f64>>,
    calls: AtomicUsize,
}

impl StaticPrice {
    pub fn new(price: f64) -> Self {
        Self {
            pair: Pair::default(),
            price: Mutex::new(Some(price)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, price: f64) {
        *self.price.lock().unwrap() = Some(price);
    }

    pub fn fail(&self) {
        *self.price.lock().unwrap() = None;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceSource for StaticPrice {
    async fn fetch_price(&self) -> Result<Price, FeedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match *self.price.lock().unwrap() {
            Some(value) => Price::new(value).map_err(|_| FeedError::InvalidPrice(value)),
            None => Err(FeedError::Timeout),
        }
    }

    fn pair(&self) -> &Pair {
        &self.pair
    }
}
