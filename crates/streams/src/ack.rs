//! Acknowledgment.

use redis::AsyncCommands;
use redis::aio::ConnectionLike;

use notiq_common::keys::KeySpace;

use crate::error::StreamError;

/// Marks delivered entries as consumed for a user's group.
#[derive(Debug, Clone)]
pub struct Acknowledger {
    keys: KeySpace,
}

impl Acknowledger {
    pub fn new(keys: KeySpace) -> Self {
        Self { keys }
    }

    /// Acknowledge the given entry ids, returning how many the store
    /// accepted. An empty id list succeeds without contacting the store.
    ///
    /// Acknowledgment operates at group level, so it covers entries no
    /// matter which connection's consumer they are pending on. Failures are
    /// returned to the caller: unlike publishing, a silently dropped ack
    /// corrupts delivery state by causing redelivery forever. Retrying a
    /// failed ack is safe; the operation is idempotent.
    pub async fn ack<C>(
        &self,
        con: &mut C,
        user_id: i64,
        entry_ids: &[String],
    ) -> Result<u64, StreamError>
    where
        C: ConnectionLike + Send,
    {
        if entry_ids.is_empty() {
            return Ok(0);
        }

        let stream_key = self.keys.stream_key(user_id);
        let group = self.keys.group_name();

        let result: redis::RedisResult<u64> = con.xack(&stream_key, &group, entry_ids).await;
        match result {
            Ok(acked) => {
                tracing::debug!(user_id, requested = entry_ids.len(), acked, "Acknowledged entries");
                Ok(acked)
            }
            Err(e) => {
                tracing::error!(
                    user_id,
                    stream = %stream_key,
                    error = %e,
                    "Failed to acknowledge entries"
                );
                Err(StreamError::Ack {
                    stream: stream_key,
                    source: e,
                })
            }
        }
    }
}
