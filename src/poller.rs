use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::command::Dispatcher;
use crate::platform::{ChatTransport, IncomingMessage};

/// Counters shared with the heartbeat job
#[derive(Debug, Default)]
pub struct PollStats {
    messages: AtomicU64,
    replies: AtomicU64,
}

impl PollStats {
    pub fn messages(&self) -> u64 {
        self.messages.load(Ordering::Relaxed)
    }

    pub fn replies(&self) -> u64 {
        self.replies.load(Ordering::Relaxed)
    }
}

/// Fetches updates on a fixed interval and answers them one at a time.
pub struct Poller<T, R> {
    transport: T,
    dispatcher: Dispatcher<R>,
    poll_interval: Duration,
    /// Smallest update id not yet processed.
    offset: i64,
    stats: Arc<PollStats>,
}

impl<T: ChatTransport, R: Rng> Poller<T, R> {
    pub fn new(transport: T, dispatcher: Dispatcher<R>, poll_interval: Duration) -> Self {
        Self {
            transport,
            dispatcher,
            poll_interval,
            offset: 0,
            stats: Arc::new(PollStats::default()),
        }
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn stats(&self) -> Arc<PollStats> {
        Arc::clone(&self.stats)
    }

    /// Poll until `cancel` fires. Fetch errors are logged and retried on the
    /// next cycle from the same offset.
    pub async fn run(&mut self, cancel: CancellationToken) {
        let timeout_secs = u32::try_from(self.poll_interval.as_secs()).unwrap_or(u32::MAX);
        info!("Polling for updates every {:?}", self.poll_interval);

        while !cancel.is_cancelled() {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }

            let fetched = tokio::select! {
                _ = cancel.cancelled() => break,
                result = self.transport.fetch_updates(self.offset, timeout_secs) => result,
            };

            let updates = match fetched {
                Ok(updates) => updates,
                Err(e) => {
                    error!("Failed to fetch updates: {:#}", e);
                    continue;
                }
            };

            if cancel.is_cancelled() {
                break;
            }

            self.process_batch(updates).await;
        }

        info!("Polling stopped");
    }

    /// Answer every update in order and move the cursor past each one.
    /// Returns the number of replies sent.
    pub async fn process_batch(&mut self, updates: Vec<IncomingMessage>) -> usize {
        let mut sent = 0;

        for update in updates {
            self.offset = update.id + 1;

            let Some(text) = update.text.as_deref().filter(|t| !t.is_empty()) else {
                continue;
            };
            self.stats.messages.fetch_add(1, Ordering::Relaxed);

            let Some(reply) = self.dispatcher.handle(text) else {
                continue;
            };
            if reply.is_empty() {
                debug!("Skipping empty reply for update {}", update.id);
                continue;
            }

            match self.transport.send_reply(update.chat_id, &reply).await {
                Ok(()) => {
                    sent += 1;
                    self.stats.replies.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => warn!("Failed to reply to update {}: {:#}", update.id, e),
            }
        }

        sent
    }
}
