use serde::Deserialize;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Deployment environment name, first component of every stream key
    pub app_env: String,

    /// Application name, second component of every stream key
    pub app_name: String,

    /// Redis connection string
    pub redis_url: String,

    /// Approximate retention cap per user stream (default: 1000)
    pub stream_max_length: usize,

    /// Maximum entries returned by a single backlog fetch (default: 100)
    pub backlog_batch_size: usize,

    /// Entries requested per blocking live read (default: 1)
    pub live_read_count: usize,

    /// Block timeout for live reads in milliseconds (default: 5000)
    pub live_block_ms: usize,

    /// Backoff after an empty or failed live read in milliseconds (default: 1000)
    pub retry_backoff_ms: u64,

    /// Consecutive live-read failures tolerated before a listener gives up
    /// (default: 300). 0 disables the budget and retries forever.
    pub listener_max_retries: u32,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            app_env: std::env::var("APP_ENV").unwrap_or_else(|_| "local".to_string()),
            app_name: std::env::var("APP_NAME").unwrap_or_else(|_| "notiq".to_string()),
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            stream_max_length: std::env::var("STREAM_MAX_LENGTH")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("STREAM_MAX_LENGTH must be a valid usize"))?,
            backlog_batch_size: std::env::var("BACKLOG_BATCH_SIZE")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("BACKLOG_BATCH_SIZE must be a valid usize"))?,
            live_read_count: std::env::var("LIVE_READ_COUNT")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("LIVE_READ_COUNT must be a valid usize"))?,
            live_block_ms: std::env::var("LIVE_BLOCK_MS")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("LIVE_BLOCK_MS must be a valid usize"))?,
            retry_backoff_ms: std::env::var("RETRY_BACKOFF_MS")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("RETRY_BACKOFF_MS must be a valid u64"))?,
            listener_max_retries: std::env::var("LISTENER_MAX_RETRIES")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("LISTENER_MAX_RETRIES must be a valid u32"))?,
        })
    }
}
