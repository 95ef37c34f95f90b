use redis::Client;
use redis::aio::ConnectionManager;

/// Open a Redis client for the given URL.
///
/// The client holds no connection of its own; it is kept around so that
/// live listeners can open dedicated connections for blocking stream reads
/// instead of stalling the shared multiplexed connection.
pub fn create_client(redis_url: &str) -> anyhow::Result<Client> {
    Ok(Client::open(redis_url)?)
}

/// Create a Redis connection manager for async operations.
pub async fn create_redis_pool(client: &Client) -> anyhow::Result<ConnectionManager> {
    let manager = ConnectionManager::new(client.clone()).await?;

    tracing::info!("Connected to Redis");
    Ok(manager)
}
