//! Rolling retention of notification messages.
//!
//! Every chat keeps the identifiers of the price notifications it was sent.
//! Once the log grows past the cap, the whole log is drained and each
//! message is deleted upstream, best-effort.

use crate::ChatTransport;
use pricewatch_core::{ChatId, MessageId};
use std::sync::Arc;
use tracing::{debug, warn};

/// Number of notifications kept before a purge.
pub const DEFAULT_RETENTION_CAP: usize = 10;

/// Ordered log of messages emitted into one chat.
#[derive(Debug, Clone)]
pub struct MessageLog {
    ids: Vec<MessageId>,
    cap: usize,
}

impl MessageLog {
    pub fn new(cap: usize) -> Self {
        Self {
            ids: Vec::with_capacity(cap + 1),
            cap,
        }
    }

    /// Append a message identifier.
    pub fn record(&mut self, message_id: MessageId) {
        self.ids.push(message_id);
    }

    /// True once the log holds more than `cap` identifiers.
    pub fn should_purge(&self) -> bool {
        self.ids.len() > self.cap
    }

    /// Take every identifier, oldest first, leaving the log empty.
    pub fn drain(&mut self) -> Vec<MessageId> {
        std::mem::take(&mut self.ids)
    }

    /// Drain the log only if it is over the cap.
    pub fn drain_if_full(&mut self) -> Option<Vec<MessageId>> {
        if self.should_purge() {
            Some(self.drain())
        } else {
            None
        }
    }

    pub fn ids(&self) -> &[MessageId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION_CAP)
    }
}

/// Outcome of a purge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub attempted: usize,
    pub deleted: usize,
}

impl PurgeReport {
    pub fn failed(&self) -> usize {
        self.attempted - self.deleted
    }
}

/// Deletes drained messages through the chat transport.
#[derive(Clone)]
pub struct MessageRetention {
    transport: Arc<dyn ChatTransport>,
}

impl MessageRetention {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self { transport }
    }

    /// Delete every identifier. A failure is logged and the remaining
    /// identifiers are still attempted.
    pub async fn purge(&self, chat_id: ChatId, ids: Vec<MessageId>) -> PurgeReport {
        let mut report = PurgeReport {
            attempted: ids.len(),
            deleted: 0,
        };

        for message_id in ids {
            match self.transport.delete_message(chat_id, message_id).await {
                Ok(()) => report.deleted += 1,
                Err(e) => {
                    warn!(
                        chat_id = %chat_id,
                        message_id = %message_id,
                        error = %e,
                        "Failed to delete retained message"
                    );
                }
            }
        }

        if report.attempted > 0 {
            debug!(
                chat_id = %chat_id,
                attempted = report.attempted,
                deleted = report.deleted,
                "Purged retained messages"
            );
        }

        report
    }
}
