//! Integration tests for API routes and the WebSocket delivery session.
//!
//! HTTP routes are driven with `tower::ServiceExt`; the WebSocket scenario
//! runs a real server on an ephemeral port. Requires a running Redis with
//! `REDIS_URL` env var set.
//!
//! ```bash
//! REDIS_URL="redis://localhost:6379" \
//!   cargo test -p notiq-api --test integration -- --ignored --nocapture
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use futures::{SinkExt, StreamExt};
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tower::ServiceExt;
use uuid::Uuid;

use notiq_api::routes::create_router;
use notiq_api::state::AppState;
use notiq_common::config::AppConfig;
use notiq_common::types::{AcknowledgeRequest, PushedNotification};

// ============================================================
// Helpers
// ============================================================

/// Config pointing at a unique key namespace so tests never collide.
fn test_config() -> AppConfig {
    AppConfig {
        app_env: format!("test-{}", Uuid::new_v4().simple()),
        app_name: "notiq".to_string(),
        redis_url: std::env::var("REDIS_URL")
            .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
        stream_max_length: 1000,
        backlog_batch_size: 100,
        live_read_count: 1,
        live_block_ms: 200,
        retry_backoff_ms: 50,
        listener_max_retries: 10,
    }
}

async fn test_state() -> AppState {
    let config = test_config();
    let client = redis::Client::open(config.redis_url.clone()).unwrap();
    let redis = redis::aio::ConnectionManager::new(client.clone())
        .await
        .unwrap();
    AppState::new(config, client, redis)
}

/// Serve the router on an ephemeral port and return its address.
async fn spawn_server(state: AppState) -> SocketAddr {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn json_request(uri: &str, body: &impl serde::Serialize) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Read WebSocket frames until the next pushed notification.
async fn next_notification<S>(ws: &mut S) -> PushedNotification
where
    S: StreamExt<Item = Result<WsMessage, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let frame = timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for notification")
            .expect("socket closed")
            .expect("socket error");
        if let WsMessage::Text(text) = frame {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

// ============================================================
// HTTP routes
// ============================================================

#[tokio::test]
#[ignore]
async fn health_check_works() {
    let app = create_router(test_state().await);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
#[ignore]
async fn acknowledge_empty_list_succeeds() {
    let app = create_router(test_state().await);

    let req = AcknowledgeRequest {
        user_id: 1,
        message_ids: vec![],
    };
    let response = app
        .oneshot(json_request("/api/notifications/acknowledge", &req))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["message"], "seen");
}

#[tokio::test]
#[ignore]
async fn acknowledge_excludes_entries_from_backlog() {
    let state = test_state().await;
    let user_id = 42;
    let mut redis = state.redis.clone();

    state.groups.ensure(&mut redis, user_id).await.unwrap();
    let entry_id = state
        .publisher
        .publish(&mut redis, user_id, "assigned to you")
        .await
        .unwrap();

    let pending = state.backlog.fetch_pending(&mut redis, user_id, "42:conn-a").await;
    assert_eq!(pending.len(), 1);

    let req = AcknowledgeRequest {
        user_id,
        message_ids: vec![entry_id],
    };
    let response = create_router(state.clone())
        .oneshot(json_request("/api/notifications/acknowledge", &req))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let pending = state.backlog.fetch_pending(&mut redis, user_id, "42:conn-b").await;
    assert!(pending.is_empty());
}

// ============================================================
// WebSocket session
// ============================================================

#[tokio::test]
#[ignore]
async fn ws_delivers_backlog_on_connect() {
    let state = test_state().await;
    let user_id = 7;
    let mut redis = state.redis.clone();

    // Published while the user had no connection
    state.groups.ensure(&mut redis, user_id).await.unwrap();
    state.publisher.publish(&mut redis, user_id, "first").await.unwrap();
    state.publisher.publish(&mut redis, user_id, "second").await.unwrap();

    let addr = spawn_server(state).await;
    let (mut ws, _) = connect_async(format!("ws://{addr}/api/notifications/ws/{user_id}"))
        .await
        .unwrap();

    let first = next_notification(&mut ws).await;
    let second = next_notification(&mut ws).await;
    assert_eq!(first.message, "first");
    assert_eq!(second.message, "second");
    assert!(first.message_id < second.message_id);

    ws.close(None).await.unwrap();
}

#[tokio::test]
#[ignore]
async fn ws_echoes_client_text_through_the_stream() {
    let state = test_state().await;
    let user_id = 8;

    let addr = spawn_server(state).await;
    let (mut ws, _) = connect_async(format!("ws://{addr}/api/notifications/ws/{user_id}"))
        .await
        .unwrap();

    ws.send(WsMessage::Text("ping".into())).await.unwrap();

    let echoed = next_notification(&mut ws).await;
    assert_eq!(echoed.message, "[Echo] ping");
    assert!(!echoed.message_id.is_empty());

    // Exactly one delivery on the live path
    let extra = timeout(Duration::from_millis(500), ws.next()).await;
    assert!(extra.is_err(), "unexpected second delivery: {extra:?}");

    ws.close(None).await.unwrap();
}

#[tokio::test]
#[ignore]
async fn ws_live_entries_can_be_acknowledged() {
    let state = test_state().await;
    let user_id = 9;
    let mut redis = state.redis.clone();

    let addr = spawn_server(state.clone()).await;
    let (mut ws, _) = connect_async(format!("ws://{addr}/api/notifications/ws/{user_id}"))
        .await
        .unwrap();

    ws.send(WsMessage::Text("hello".into())).await.unwrap();
    let delivered = next_notification(&mut ws).await;
    ws.close(None).await.unwrap();

    state
        .acknowledger
        .ack(&mut redis, user_id, &[delivered.message_id])
        .await
        .unwrap();

    // Nothing left pending for the next connection
    let pending = state.backlog.fetch_pending(&mut redis, user_id, "9:conn-b").await;
    assert!(pending.is_empty());
}
