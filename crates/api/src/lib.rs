//! Notiq API server: WebSocket delivery sessions, the acknowledge
//! endpoint, and the live connection registry.

pub mod connection;
pub mod routes;
pub mod state;
