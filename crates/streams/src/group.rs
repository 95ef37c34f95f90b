//! Consumer group management.

use redis::AsyncCommands;
use redis::aio::ConnectionLike;

use notiq_common::keys::KeySpace;

use crate::error::StreamError;

/// Start position for new consumer groups: the beginning of the stream, so
/// entries published before the user's first connection are still visible
/// to backlog delivery.
const GROUP_START_ID: &str = "0-0";

/// Idempotently creates the durable read cursor for a user's stream.
#[derive(Debug, Clone)]
pub struct GroupManager {
    keys: KeySpace,
}

impl GroupManager {
    pub fn new(keys: KeySpace) -> Self {
        Self { keys }
    }

    /// Ensure the consumer group exists, auto-creating the stream if absent.
    ///
    /// A group that already exists is success. Any other failure leaves the
    /// session without a usable cursor and is returned for the caller to
    /// abort on.
    pub async fn ensure<C>(&self, con: &mut C, user_id: i64) -> Result<(), StreamError>
    where
        C: ConnectionLike + Send,
    {
        let stream_key = self.keys.stream_key(user_id);
        let group = self.keys.group_name();

        match con
            .xgroup_create_mkstream::<_, _, _, ()>(&stream_key, &group, GROUP_START_ID)
            .await
        {
            Ok(()) => {
                tracing::debug!(user_id, stream = %stream_key, "Created consumer group");
                Ok(())
            }
            Err(e) if e.code() == Some("BUSYGROUP") => Ok(()),
            Err(e) => {
                tracing::error!(
                    user_id,
                    stream = %stream_key,
                    error = %e,
                    "Failed to create consumer group"
                );
                Err(StreamError::GroupCreate {
                    stream: stream_key,
                    source: e,
                })
            }
        }
    }
}
