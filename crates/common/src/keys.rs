//! Stream key derivation.
//!
//! Every per-user stream and the shared consumer group name live under a
//! `{env}:{app}:` namespace so one Redis instance can serve several
//! deployments without key collisions. Derivation is pure string
//! concatenation with no I/O.

use crate::config::AppConfig;

/// Key component for per-user notification streams.
const STREAM_PREFIX: &str = "notifications";

/// Key component for the consumer group name. The group name is shared
/// across all per-user streams; it is not itself per-user.
const GROUP_PREFIX: &str = "notification_group";

/// Namespace for stream and group keys, fixed at startup.
#[derive(Debug, Clone)]
pub struct KeySpace {
    env: String,
    app: String,
}

impl KeySpace {
    pub fn new(env: impl Into<String>, app: impl Into<String>) -> Self {
        Self {
            env: env.into(),
            app: app.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.app_env, &config.app_name)
    }

    /// Key of the append-only notification stream for one user.
    pub fn stream_key(&self, user_id: i64) -> String {
        format!("{}:{}:{}:{}", self.env, self.app, STREAM_PREFIX, user_id)
    }

    /// Name of the consumer group, reused across every per-user stream.
    pub fn group_name(&self) -> String {
        format!("{}:{}:{}", self.env, self.app, GROUP_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_key_is_deterministic() {
        let keys = KeySpace::new("local", "notiq");
        assert_eq!(keys.stream_key(42), "local:notiq:notifications:42");
        assert_eq!(keys.stream_key(42), keys.stream_key(42));
    }

    #[test]
    fn stream_keys_are_per_user() {
        let keys = KeySpace::new("local", "notiq");
        assert_ne!(keys.stream_key(1), keys.stream_key(2));
    }

    #[test]
    fn group_name_is_not_per_user() {
        let keys = KeySpace::new("prod", "notiq");
        assert_eq!(keys.group_name(), "prod:notiq:notification_group");
    }

    #[test]
    fn namespaces_do_not_collide() {
        let staging = KeySpace::new("staging", "notiq");
        let prod = KeySpace::new("prod", "notiq");
        assert_ne!(staging.stream_key(7), prod.stream_key(7));
        assert_ne!(staging.group_name(), prod.group_name());
    }
}
