//! Stream publisher.

use chrono::Utc;
use redis::AsyncCommands;
use redis::aio::ConnectionLike;
use redis::streams::StreamMaxlen;

use notiq_common::keys::KeySpace;

use crate::entry::{FIELD_MESSAGE, FIELD_TIMESTAMP};

/// Appends notification entries to per-user streams, trimming each stream
/// toward its retention cap.
#[derive(Debug, Clone)]
pub struct Publisher {
    keys: KeySpace,
    max_len: usize,
}

impl Publisher {
    pub fn new(keys: KeySpace, max_len: usize) -> Self {
        Self { keys, max_len }
    }

    /// Append `message` to the user's stream and return the new entry id.
    ///
    /// Delivery is best effort: any store failure is logged and `None` is
    /// returned, so the business operation that triggered the notification
    /// never fails on it. Trimming uses `MAXLEN ~`, which may lag slightly
    /// behind the cap but converges toward it.
    pub async fn publish<C>(&self, con: &mut C, user_id: i64, message: &str) -> Option<String>
    where
        C: ConnectionLike + Send,
    {
        let stream_key = self.keys.stream_key(user_id);
        let fields = [
            (FIELD_MESSAGE, message.to_string()),
            (FIELD_TIMESTAMP, Utc::now().timestamp().to_string()),
        ];

        let result: redis::RedisResult<String> = con
            .xadd_maxlen(&stream_key, StreamMaxlen::Approx(self.max_len), "*", &fields)
            .await;

        match result {
            Ok(entry_id) => {
                tracing::debug!(user_id, entry_id = %entry_id, "Published notification");
                Some(entry_id)
            }
            Err(e) => {
                tracing::warn!(
                    user_id,
                    stream = %stream_key,
                    error = %e,
                    "Failed to publish notification"
                );
                None
            }
        }
    }
}
