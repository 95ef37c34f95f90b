//! Acknowledgment endpoint.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;

use notiq_common::error::AppError;
use notiq_common::types::AcknowledgeRequest;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/notifications/acknowledge", post(acknowledge))
}

/// POST /api/notifications/acknowledge — mark delivered notifications as seen.
///
/// Failures surface to the client as an explicit error: acknowledgment is
/// idempotent, so the right client response to a failure is a retry.
async fn acknowledge(
    State(state): State<AppState>,
    Json(req): Json<AcknowledgeRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut redis = state.redis.clone();
    state
        .acknowledger
        .ack(&mut redis, req.user_id, &req.message_ids)
        .await?;

    Ok(Json(json!({ "message": "seen" })))
}
