use serde::{Deserialize, Serialize};

/// A notification delivered to a client, either from the backlog or the
/// live stream. `message_id` is the stream entry id and must be echoed
/// back verbatim in an acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushedNotification {
    pub message_id: String,
    pub message: String,
}

/// Request body for the acknowledge endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcknowledgeRequest {
    pub user_id: i64,
    pub message_ids: Vec<String>,
}
