//! WebSocket delivery session.
//!
//! Per-connection lifecycle: register a handle → ensure the user's consumer
//! group exists (failure closes the session) → deliver the backlog → stream
//! live entries from a spawned listener task until the client disconnects.
//! Client text frames are not answered directly; they are re-published
//! through the durable stream with an echo prefix, so every outbound byte
//! flows through the same at-least-once path.

use axum::Router;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use notiq_common::types::PushedNotification;

use crate::state::AppState;

/// Outbound queue depth per connection.
const OUTBOUND_BUFFER: usize = 256;

/// Prefix applied to client text before it is re-published.
const ECHO_PREFIX: &str = "[Echo] ";

pub fn router() -> Router<AppState> {
    Router::new().route("/api/notifications/ws/{user_id}", get(ws_handler))
}

/// GET /api/notifications/ws/:user_id — upgrade to a delivery session.
async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(user_id): Path<i64>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, user_id, state))
}

/// Drives one connection from registration to teardown.
async fn handle_socket(socket: WebSocket, user_id: i64, state: AppState) {
    let (tx, mut rx) = mpsc::channel::<PushedNotification>(OUTBOUND_BUFFER);
    let handle = state.registry.register(user_id, tx);
    let conn_id = handle.id;
    tracing::info!(user_id, %conn_id, "WebSocket connected");

    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Forward queued notifications to the socket, one JSON object per entry.
    // Started before backlog delivery so a large backlog cannot fill the
    // queue with nothing draining it.
    let forward_task = tokio::spawn(async move {
        while let Some(notification) = rx.recv().await {
            match serde_json::to_string(&notification) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize notification");
                }
            }
        }
    });

    let mut redis = state.redis.clone();

    // Without a consumer group there is no durable cursor to deliver
    // against; close the session instead of proceeding.
    if let Err(e) = state.groups.ensure(&mut redis, user_id).await {
        tracing::error!(user_id, %conn_id, error = %e, "Closing session: no usable consumer group");
        state.registry.remove(&handle);
        forward_task.abort();
        return;
    }

    // Backlog first. Entries that were published while this user was
    // offline, or delivered to a previous connection and never acked, go
    // out before any live entry. A fetch failure delivers nothing but
    // still lets the session go live.
    let consumer = handle.consumer_name();
    let backlog = state.backlog.fetch_pending(&mut redis, user_id, &consumer).await;
    if !backlog.is_empty() {
        tracing::debug!(user_id, %conn_id, count = backlog.len(), "Delivering backlog");
        for notification in backlog {
            if !handle.send(notification).await {
                state.registry.remove(&handle);
                forward_task.abort();
                return;
            }
        }
    }

    // The live listener blocks on XREADGROUP, so it gets a connection of
    // its own; sharing the multiplexed one would stall every other command
    // behind the block timeout.
    let listener_task = match state.redis_client.get_multiplexed_async_connection().await {
        Ok(mut listener_con) => {
            let listener = state.listener.clone();
            let sink = handle.sender();
            let consumer = consumer.clone();
            tokio::spawn(async move {
                if let Err(e) = listener.run(&mut listener_con, user_id, &consumer, sink).await {
                    tracing::error!(user_id, error = %e, "Live listener gave up");
                }
            })
        }
        Err(e) => {
            tracing::error!(user_id, %conn_id, error = %e, "Closing session: no dedicated store connection");
            state.registry.remove(&handle);
            forward_task.abort();
            return;
        }
    };

    // Receive loop: echo client text back through the durable stream.
    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => {
                let echoed = format!("{ECHO_PREFIX}{text}");
                state.publisher.publish(&mut redis, user_id, &echoed).await;
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(user_id, %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    // Teardown: stop the listener before dropping the registration so a
    // half-dead task never sends on a deregistered handle.
    listener_task.abort();
    state.registry.remove(&handle);
    forward_task.abort();
    tracing::info!(user_id, %conn_id, "WebSocket disconnected");
}
