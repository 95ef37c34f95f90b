//! Live connection registry.
//!
//! Tracks every open WebSocket connection, keyed by user id. A user may
//! hold zero, one, or many simultaneous connections (multi-device);
//! registration and removal race freely with delivery, so the map is a
//! sharded concurrent `DashMap` rather than a single lock.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use notiq_common::types::PushedNotification;

/// Unique identifier for one WebSocket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0.simple())
    }
}

/// One live client connection for a user.
#[derive(Debug)]
pub struct ConnectionHandle {
    pub id: ConnectionId,
    pub user_id: i64,
    sender: mpsc::Sender<PushedNotification>,
}

impl ConnectionHandle {
    /// Consumer identity this connection reads under. Scoping the consumer
    /// to the (user, connection) pair keeps the store from splitting one
    /// user's pending entries arbitrarily across their devices.
    pub fn consumer_name(&self) -> String {
        format!("{}:{}", self.user_id, self.id)
    }

    /// Clone of the outbound queue feeding this connection's socket.
    pub fn sender(&self) -> mpsc::Sender<PushedNotification> {
        self.sender.clone()
    }

    /// Queue a notification for this connection. Returns `false` when the
    /// connection is already going away; sending to a closed handle is a
    /// no-op, not an error.
    pub async fn send(&self, notification: PushedNotification) -> bool {
        self.sender.send(notification).await.is_ok()
    }
}

/// Registry of all live connections across all users.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: DashMap<i64, Vec<Arc<ConnectionHandle>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection for `user_id` and return its handle.
    pub fn register(
        &self,
        user_id: i64,
        sender: mpsc::Sender<PushedNotification>,
    ) -> Arc<ConnectionHandle> {
        let handle = Arc::new(ConnectionHandle {
            id: ConnectionId::generate(),
            user_id,
            sender,
        });
        self.connections
            .entry(user_id)
            .or_default()
            .push(handle.clone());
        handle
    }

    /// Remove a connection. Removing a handle that is already gone is a
    /// no-op.
    pub fn remove(&self, handle: &ConnectionHandle) {
        let mut emptied = false;
        if let Some(mut entry) = self.connections.get_mut(&handle.user_id) {
            entry.retain(|h| h.id != handle.id);
            emptied = entry.is_empty();
        }
        if emptied {
            self.connections
                .remove_if(&handle.user_id, |_, handles| handles.is_empty());
        }
    }

    /// Deliver a notification to every live connection of `user_id`,
    /// returning how many accepted it. Closed connections are skipped.
    pub async fn send_to_user(&self, user_id: i64, notification: PushedNotification) -> usize {
        // Clone the handles out so no map shard stays locked across await
        let handles: Vec<Arc<ConnectionHandle>> = match self.connections.get(&user_id) {
            Some(entry) => entry.clone(),
            None => return 0,
        };

        let mut delivered = 0;
        for handle in handles {
            if handle.send(notification.clone()).await {
                delivered += 1;
            }
        }
        delivered
    }

    /// Number of live connections across all users.
    pub fn connection_count(&self) -> usize {
        self.connections.iter().map(|entry| entry.len()).sum()
    }

    /// Number of live connections for one user.
    pub fn user_connection_count(&self, user_id: i64) -> usize {
        self.connections
            .get(&user_id)
            .map(|entry| entry.len())
            .unwrap_or(0)
    }
}
