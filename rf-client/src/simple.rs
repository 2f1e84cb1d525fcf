//! # Simple API
//!
//! Purpose: One-call client creation from a connection string, through a
//! process-wide factory holding the default builders.

use std::sync::OnceLock;

use rf_common::{parse_redis_uri, ConfigError, ConnectionConfig};

use crate::client::{FactoryResult, RedisClient};
use crate::factory::ClientFactory;

static DEFAULT_FACTORY: OnceLock<ClientFactory> = OnceLock::new();

/// Factory with the standalone, sentinel and cluster builders registered.
pub fn default_factory() -> &'static ClientFactory {
    DEFAULT_FACTORY.get_or_init(ClientFactory::with_default_builders)
}

fn parse(redis_dsn: &str) -> FactoryResult<ConnectionConfig> {
    if redis_dsn.trim().is_empty() {
        return Err(ConfigError::EmptyUri.into());
    }
    Ok(parse_redis_uri(redis_dsn)?)
}

/// Creates a client from a connection string on the blocking path.
///
/// # Examples
/// ```rust,no_run
/// use redis::Commands;
///
/// let client = rf_client::get_redis_client("redis://:secret@localhost:6379/1").unwrap();
/// let mut conn = client.get_connection().unwrap();
/// let _: () = conn.set("key", "value").unwrap();
/// ```
pub fn get_redis_client(redis_dsn: &str) -> FactoryResult<RedisClient> {
    let config = parse(redis_dsn)?;
    default_factory().create_client(&config)
}

/// Creates a client from a connection string on the async path.
///
/// # Examples
/// ```rust,no_run
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// use redis::AsyncCommands;
///
/// let client = rf_client::get_async_redis_client("redis+cluster://node1:7000,node2:7001").await?;
/// let mut conn = client.get_async_connection().await?;
/// let _: () = conn.set("key", "value").await?;
/// # Ok(())
/// # }
/// ```
pub async fn get_async_redis_client(redis_dsn: &str) -> FactoryResult<RedisClient> {
    let config = parse(redis_dsn)?;
    default_factory().create_async_client(&config).await
}

/// Creates a client from an existing descriptor on the blocking path.
pub fn create_redis_client(config: &ConnectionConfig) -> FactoryResult<RedisClient> {
    default_factory().create_client(config)
}

/// Creates a client from an existing descriptor on the async path.
pub async fn create_async_redis_client(config: &ConnectionConfig) -> FactoryResult<RedisClient> {
    default_factory().create_async_client(config).await
}
