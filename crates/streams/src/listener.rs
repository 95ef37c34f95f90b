//! Live listener.

use std::time::Duration;

use redis::AsyncCommands;
use redis::aio::ConnectionLike;
use redis::streams::{StreamReadOptions, StreamReadReply};
use tokio::sync::mpsc;

use notiq_common::config::AppConfig;
use notiq_common::keys::KeySpace;
use notiq_common::types::PushedNotification;

use crate::entry;
use crate::error::StreamError;

/// Read position for entries never delivered to any consumer.
const NEW_ENTRIES_ID: &str = ">";

/// Tunables for the live read loop.
#[derive(Debug, Clone)]
pub struct ListenerSettings {
    /// Entries requested per blocking read
    pub read_count: usize,
    /// Block timeout per read in milliseconds
    pub block_ms: usize,
    /// Sleep between empty or failed reads
    pub backoff: Duration,
    /// Consecutive failures tolerated before giving up; 0 retries forever
    pub max_retries: u32,
}

impl ListenerSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            read_count: config.live_read_count,
            block_ms: config.live_block_ms,
            backoff: Duration::from_millis(config.retry_backoff_ms),
            max_retries: config.listener_max_retries,
        }
    }
}

impl Default for ListenerSettings {
    fn default() -> Self {
        Self {
            read_count: 1,
            block_ms: 5000,
            backoff: Duration::from_millis(1000),
            max_retries: 300,
        }
    }
}

/// Long-running reader that forwards new stream entries to a connected
/// client's queue.
#[derive(Debug, Clone)]
pub struct LiveListener {
    keys: KeySpace,
    settings: ListenerSettings,
}

impl LiveListener {
    pub fn new(keys: KeySpace, settings: ListenerSettings) -> Self {
        Self { keys, settings }
    }

    /// Block for new entries and forward each one to `sink` in delivery
    /// order, until the owning task is aborted or the sink closes.
    ///
    /// Each read blocks with a bounded timeout so task cancellation is
    /// observed promptly. Store errors back off and retry against a
    /// configurable budget; spending the budget returns
    /// [`StreamError::RetriesExhausted`]. A closed sink means the
    /// connection is shutting down and ends the loop cleanly.
    ///
    /// `con` must be a dedicated connection: the blocking read would stall
    /// every other command multiplexed onto a shared one.
    pub async fn run<C>(
        &self,
        con: &mut C,
        user_id: i64,
        consumer: &str,
        sink: mpsc::Sender<PushedNotification>,
    ) -> Result<(), StreamError>
    where
        C: ConnectionLike + Send,
    {
        let stream_key = self.keys.stream_key(user_id);
        let group = self.keys.group_name();
        let options = StreamReadOptions::default()
            .group(&group, consumer)
            .count(self.settings.read_count)
            .block(self.settings.block_ms);

        let mut failures: u32 = 0;

        loop {
            let reply: redis::RedisResult<StreamReadReply> = con
                .xread_options(&[&stream_key], &[NEW_ENTRIES_ID], &options)
                .await;

            match reply {
                Ok(reply) => {
                    failures = 0;
                    let mut delivered = false;

                    for stream in reply.keys {
                        for raw in stream.ids {
                            delivered = true;
                            let Some(notification) = entry::to_notification(&raw) else {
                                continue;
                            };
                            if sink.send(notification).await.is_err() {
                                // Receiver dropped: the connection is closing
                                tracing::debug!(user_id, consumer, "Listener sink closed");
                                return Ok(());
                            }
                        }
                    }

                    // Block timeout with no data
                    if !delivered {
                        tokio::time::sleep(self.settings.backoff).await;
                    }
                }
                Err(e) => {
                    failures += 1;
                    tracing::warn!(
                        user_id,
                        stream = %stream_key,
                        error = %e,
                        failures,
                        "Live read failed, backing off"
                    );
                    if self.settings.max_retries != 0 && failures >= self.settings.max_retries {
                        return Err(StreamError::RetriesExhausted { retries: failures });
                    }
                    tokio::time::sleep(self.settings.backoff).await;
                }
            }
        }
    }
}
