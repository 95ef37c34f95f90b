use thiserror::Error;

use notiq_common::error::AppError;

/// Failure taxonomy for stream operations.
///
/// Callers decide fatal vs. recoverable: publish and backlog failures are
/// absorbed where they occur (freshness only), while group-creation and
/// acknowledge failures surface here because they affect the correctness of
/// delivery state.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Transient store failure on a retryable path.
    #[error("store error: {0}")]
    Store(#[from] redis::RedisError),

    /// The consumer group could not be created; the session has no usable
    /// cursor and must abort. A `BUSYGROUP` reply never produces this.
    #[error("failed to create consumer group on {stream}: {source}")]
    GroupCreate {
        stream: String,
        source: redis::RedisError,
    },

    /// Acknowledge failed. Raised rather than swallowed: a silently dropped
    /// ack means permanent redelivery of the affected entries.
    #[error("failed to acknowledge entries on {stream}: {source}")]
    Ack {
        stream: String,
        source: redis::RedisError,
    },

    /// The live listener spent its retry budget against a broken store.
    #[error("live read retries exhausted after {retries} attempts")]
    RetriesExhausted { retries: u32 },
}

impl From<StreamError> for AppError {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::Store(e)
            | StreamError::GroupCreate { source: e, .. }
            | StreamError::Ack { source: e, .. } => AppError::Redis(e),
            other => AppError::Internal(other.to_string()),
        }
    }
}
