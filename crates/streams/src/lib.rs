//! Durable per-user notification streams over Redis.
//!
//! One append-only stream per user holds every notification published to
//! them, trimmed toward a bounded retention cap. A single consumer group
//! name (shared across all per-user streams) tracks which entries have been
//! delivered and acknowledged, giving at-least-once delivery across client
//! reconnects and process restarts.
//!
//! Components, in the order a session uses them:
//! - [`Publisher`] appends entries (best effort, never fails the caller)
//! - [`GroupManager`] lazily creates the per-stream consumer group
//! - [`BacklogFetcher`] claims and returns everything not yet acknowledged
//! - [`LiveListener`] blocks for new entries and forwards them to a sink
//! - [`Acknowledger`] marks delivered entries as consumed

pub mod ack;
pub mod backlog;
pub mod entry;
pub mod error;
pub mod group;
pub mod listener;
pub mod publisher;

pub use ack::Acknowledger;
pub use backlog::BacklogFetcher;
pub use error::StreamError;
pub use group::GroupManager;
pub use listener::{ListenerSettings, LiveListener};
pub use publisher::Publisher;
