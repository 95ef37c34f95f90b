//! Shared application state for the Axum API server.

use std::sync::Arc;

use redis::Client;
use redis::aio::ConnectionManager;

use notiq_common::config::AppConfig;
use notiq_common::keys::KeySpace;
use notiq_streams::{
    Acknowledger, BacklogFetcher, GroupManager, ListenerSettings, LiveListener, Publisher,
};

use crate::connection::ConnectionRegistry;

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    /// Shared multiplexed connection for non-blocking commands
    pub redis: ConnectionManager,
    /// Client handle for opening dedicated blocking-read connections
    pub redis_client: Client,
    pub registry: Arc<ConnectionRegistry>,
    pub publisher: Publisher,
    pub groups: GroupManager,
    pub backlog: BacklogFetcher,
    pub listener: LiveListener,
    pub acknowledger: Acknowledger,
}

impl AppState {
    pub fn new(config: AppConfig, redis_client: Client, redis: ConnectionManager) -> Self {
        let keys = KeySpace::from_config(&config);
        Self {
            publisher: Publisher::new(keys.clone(), config.stream_max_length),
            groups: GroupManager::new(keys.clone()),
            backlog: BacklogFetcher::new(keys.clone(), config.backlog_batch_size),
            listener: LiveListener::new(keys.clone(), ListenerSettings::from_config(&config)),
            acknowledger: Acknowledger::new(keys),
            registry: Arc::new(ConnectionRegistry::new()),
            config,
            redis,
            redis_client,
        }
    }
}
