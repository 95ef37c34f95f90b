//! Notiq API server binary entrypoint.

use std::net::SocketAddr;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use notiq_common::config::AppConfig;
use notiq_common::redis_pool::{create_client, create_redis_pool};

use notiq_api::routes::create_router;
use notiq_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("notiq_api=debug,notiq_streams=debug,tower_http=debug")
        }))
        .init();

    tracing::info!("Starting Notiq API server...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Create Redis client + shared connection
    let client = create_client(&config.redis_url)?;
    let redis = create_redis_pool(&client).await?;
    tracing::info!("Redis connection established");

    // Build application state
    let state = AppState::new(config, client, redis);

    // Build router
    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    tracing::info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
