//! Backlog delivery.
//!
//! The backlog for a user is every entry not yet acknowledged: entries that
//! were delivered to an earlier (or parallel) connection and never acked,
//! plus entries appended while the user had no connection at all. Each
//! connection reads under its own consumer identity inside the shared
//! group, so collecting the full per-user view takes two steps:
//!
//! 1. `XAUTOCLAIM` with zero min-idle-time sweeps pending entries off every
//!    consumer in the group onto this connection's consumer.
//! 2. A non-blocking `XREADGROUP >` catch-up read pulls entries the group
//!    has never delivered to anyone.
//!
//! Both sets come back in id order and claimed entries always precede
//! never-delivered ones, so concatenation preserves append order.

use redis::AsyncCommands;
use redis::aio::ConnectionLike;
use redis::streams::{
    StreamAutoClaimOptions, StreamAutoClaimReply, StreamReadOptions, StreamReadReply,
};

use notiq_common::keys::KeySpace;
use notiq_common::types::PushedNotification;

use crate::entry;

/// Claim start position covering the whole pending entry list.
const CLAIM_START_ID: &str = "0-0";

/// Read position for entries never delivered to any consumer.
const NEW_ENTRIES_ID: &str = ">";

/// Retrieves all unacknowledged entries for a user, capped per call.
#[derive(Debug, Clone)]
pub struct BacklogFetcher {
    keys: KeySpace,
    batch_size: usize,
}

impl BacklogFetcher {
    pub fn new(keys: KeySpace, batch_size: usize) -> Self {
        Self { keys, batch_size }
    }

    /// Fetch every entry pending for the user, assigning each to `consumer`.
    ///
    /// Returns at most the configured batch size per call; remaining
    /// entries show up on the next fetch. Errors are logged and yield an
    /// empty list so a backlog failure never blocks the client from
    /// proceeding to live listening.
    pub async fn fetch_pending<C>(
        &self,
        con: &mut C,
        user_id: i64,
        consumer: &str,
    ) -> Vec<PushedNotification>
    where
        C: ConnectionLike + Send,
    {
        let stream_key = self.keys.stream_key(user_id);
        let group = self.keys.group_name();
        let mut notifications = Vec::new();

        // Step 1: take over entries left pending by other consumers.
        let claim_options = StreamAutoClaimOptions::default().count(self.batch_size);
        let claimed: redis::RedisResult<StreamAutoClaimReply> = con
            .xautoclaim_options(
                &stream_key,
                &group,
                consumer,
                0usize,
                CLAIM_START_ID,
                claim_options,
            )
            .await;

        match claimed {
            Ok(reply) => {
                notifications.extend(reply.claimed.iter().filter_map(entry::to_notification));
            }
            Err(e) => {
                tracing::warn!(
                    user_id,
                    stream = %stream_key,
                    error = %e,
                    "Failed to claim pending entries"
                );
                return notifications;
            }
        }

        let remaining = self.batch_size.saturating_sub(notifications.len());
        if remaining == 0 {
            return notifications;
        }

        // Step 2: pull entries the group has never delivered. No BLOCK
        // option, so this returns immediately when the stream is drained.
        let read_options = StreamReadOptions::default()
            .group(&group, consumer)
            .count(remaining);
        let undelivered: redis::RedisResult<StreamReadReply> = con
            .xread_options(&[&stream_key], &[NEW_ENTRIES_ID], &read_options)
            .await;

        match undelivered {
            Ok(reply) => {
                for stream in reply.keys {
                    notifications.extend(stream.ids.iter().filter_map(entry::to_notification));
                }
            }
            Err(e) => {
                tracing::warn!(
                    user_id,
                    stream = %stream_key,
                    error = %e,
                    "Failed to read undelivered backlog entries"
                );
            }
        }

        notifications
    }
}
