//! Recurring notification jobs, one per chat.
//!
//! A job is a spawned ticker task that fires immediately and then every
//! period. Each tick runs in its own task so a slow or failing tick never
//! delays the next one. Cancelling a job flips its [`JobToken`] before the
//! task is aborted; tick handlers check the token while holding the chat's
//! lock, so a replaced job cannot deliver anything once the replacement has
//! been installed.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use pricewatch_core::{BotResult, ChatId};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Work performed on every tick of a chat's job.
#[async_trait]
pub trait TickHandler: Send + Sync {
    async fn on_tick(&self, chat_id: ChatId, job: JobToken) -> BotResult<()>;
}

/// Shared cancellation flag of one installed job.
#[derive(Debug, Clone)]
pub struct JobToken {
    id: u64,
    cancelled: Arc<AtomicBool>,
}

impl JobToken {
    pub(crate) fn new(id: u64) -> Self {
        Self {
            id,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub(crate) fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

/// Handle to a chat's running job. Dropping it cancels the job.
#[derive(Debug)]
pub struct ScheduledJob {
    chat_id: ChatId,
    period: Duration,
    token: JobToken,
    handle: JoinHandle<()>,
}

impl ScheduledJob {
    fn spawn(chat_id: ChatId, period: Duration, token: JobToken, handler: Arc<dyn TickHandler>) -> Self {
        let job_token = token.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if job_token.is_cancelled() {
                    break;
                }

                let handler = Arc::clone(&handler);
                let token = job_token.clone();
                tokio::spawn(async move {
                    if let Err(e) = handler.on_tick(chat_id, token).await {
                        warn!(chat_id = %chat_id, error = %e, "Tick failed");
                    }
                });
            }

            debug!(chat_id = %chat_id, job_id = job_token.id(), "Job loop exited");
        });

        Self {
            chat_id,
            period,
            token,
            handle,
        }
    }

    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn token(&self) -> &JobToken {
        &self.token
    }

    fn cancel(&self) {
        self.token.cancel();
        self.handle.abort();
    }
}

impl Drop for ScheduledJob {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Owns at most one active job per chat.
#[derive(Debug, Default)]
pub struct NotificationScheduler {
    jobs: DashMap<ChatId, ScheduledJob>,
    next_job_id: AtomicU64,
}

impl NotificationScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the chat's job with one that ticks now and then every
    /// `period`. The previous job, if any, is cancelled before the new one
    /// is spawned.
    pub fn install(
        &self,
        chat_id: ChatId,
        period: Duration,
        handler: Arc<dyn TickHandler>,
    ) -> JobToken {
        // tokio's interval panics on a zero period.
        let period = period.max(Duration::from_millis(1));
        let token = JobToken::new(self.next_job_id.fetch_add(1, Ordering::Relaxed));

        match self.jobs.entry(chat_id) {
            Entry::Occupied(mut entry) => {
                entry.get().cancel();
                let job = ScheduledJob::spawn(chat_id, period, token.clone(), handler);
                let previous = entry.insert(job);
                info!(
                    chat_id = %chat_id,
                    job_id = token.id(),
                    replaced_job_id = previous.token.id(),
                    period_secs = period.as_secs(),
                    "Replaced notification job"
                );
            }
            Entry::Vacant(entry) => {
                entry.insert(ScheduledJob::spawn(chat_id, period, token.clone(), handler));
                info!(
                    chat_id = %chat_id,
                    job_id = token.id(),
                    period_secs = period.as_secs(),
                    "Installed notification job"
                );
            }
        }

        token
    }

    /// Stop and remove the chat's job. Returns false if there was none.
    pub fn cancel(&self, chat_id: ChatId) -> bool {
        match self.jobs.remove(&chat_id) {
            Some((_, job)) => {
                job.cancel();
                info!(chat_id = %chat_id, job_id = job.token.id(), "Cancelled notification job");
                true
            }
            None => false,
        }
    }

    /// Cancel every job.
    pub fn cancel_all(&self) -> usize {
        let chat_ids: Vec<ChatId> = self.jobs.iter().map(|entry| *entry.key()).collect();
        chat_ids
            .into_iter()
            .filter(|chat_id| self.cancel(*chat_id))
            .count()
    }

    pub fn is_active(&self, chat_id: ChatId) -> bool {
        self.jobs.contains_key(&chat_id)
    }

    pub fn period(&self, chat_id: ChatId) -> Option<Duration> {
        self.jobs.get(&chat_id).map(|job| job.period())
    }

    pub fn active_jobs(&self) -> usize {
        self.jobs.len()
    }
}
