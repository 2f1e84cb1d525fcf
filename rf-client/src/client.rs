//! # Client Handle
//!
//! Purpose: Wrap whatever the `redis` crate produced for a topology in one
//! handle, and hand out blocking or async connections with the descriptor's
//! timeouts applied.
//!
//! ## Design Principles
//! 1. **Facade Pattern**: `RedisClient` hides whether a node client or a
//!    cluster client sits underneath.
//! 2. **Pass-Through**: Connections implement the library's `ConnectionLike`
//!    traits by delegation, so every `Commands` helper works unchanged.
//! 3. **No Added Policy**: Errors from `redis` surface as-is; nothing is
//!    retried or pooled here.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use redis::aio::{ConnectionLike as AsyncConnectionLike, MultiplexedConnection};
use redis::cluster::{ClusterClient, ClusterConnection};
use redis::{
    AsyncConnectionConfig, Cmd, ConnectionLike, Pipeline, RedisError, RedisFuture, RedisResult,
    Value,
};
use thiserror::Error;
use tracing::debug;

use rf_common::{ConfigError, Mode, PoolSettings};

/// Result type for client construction.
pub type FactoryResult<T> = Result<T, FactoryError>;

/// Errors surfaced while turning a descriptor into a client.
#[derive(Debug, Error)]
pub enum FactoryError {
    /// The descriptor or URI was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The `redis` crate refused the parameters or could not connect.
    #[error(transparent)]
    Redis(#[from] RedisError),
    /// The CA bundle named by `ssl_ca_certs` could not be read.
    #[error("failed to read CA certificates from {}: {source}", .path.display())]
    CaCerts {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// No builder is registered for the descriptor's mode.
    #[error("Client creation for {0} mode not yet implemented")]
    NotImplemented(Mode),
}

/// The object produced by the `redis` crate for a topology.
#[derive(Clone)]
pub enum ClientHandle {
    /// Standalone node, or the primary resolved through sentinels.
    Node(redis::Client),
    /// Cluster client over the startup nodes.
    Cluster(ClusterClient),
}

/// Ready-to-use client for one deployment.
#[derive(Clone)]
pub struct RedisClient {
    mode: Mode,
    handle: ClientHandle,
    pool: PoolSettings,
}

impl RedisClient {
    pub(crate) fn new(mode: Mode, handle: ClientHandle, pool: PoolSettings) -> Self {
        RedisClient { mode, handle, pool }
    }

    /// Mode of the descriptor this client was built from.
    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[inline]
    pub fn handle(&self) -> &ClientHandle {
        &self.handle
    }

    pub fn into_handle(self) -> ClientHandle {
        self.handle
    }

    #[inline]
    pub fn pool(&self) -> &PoolSettings {
        &self.pool
    }

    /// Node client, for standalone and sentinel modes.
    pub fn as_node(&self) -> Option<&redis::Client> {
        match &self.handle {
            ClientHandle::Node(client) => Some(client),
            ClientHandle::Cluster(_) => None,
        }
    }

    pub fn as_cluster(&self) -> Option<&ClusterClient> {
        match &self.handle {
            ClientHandle::Cluster(client) => Some(client),
            ClientHandle::Node(_) => None,
        }
    }

    /// Opens a blocking connection.
    ///
    /// Node connections get the connect timeout and the socket read/write
    /// timeout; cluster connections carry both from construction.
    pub fn get_connection(&self) -> RedisResult<RedisConnection> {
        match &self.handle {
            ClientHandle::Node(client) => {
                let conn = match non_zero(self.pool.socket_connect_timeout) {
                    Some(timeout) => client.get_connection_with_timeout(timeout)?,
                    None => client.get_connection()?,
                };
                let socket_timeout = non_zero(self.pool.socket_timeout);
                conn.set_read_timeout(socket_timeout)?;
                conn.set_write_timeout(socket_timeout)?;
                Ok(RedisConnection::Node(conn))
            }
            ClientHandle::Cluster(client) => Ok(RedisConnection::Cluster(client.get_connection()?)),
        }
    }

    /// Opens an async connection on the current tokio runtime.
    pub async fn get_async_connection(&self) -> RedisResult<AsyncRedisConnection> {
        match &self.handle {
            ClientHandle::Node(client) => {
                let mut async_config = AsyncConnectionConfig::new();
                if let Some(timeout) = non_zero(self.pool.socket_timeout) {
                    async_config = async_config.set_response_timeout(timeout);
                }
                if let Some(timeout) = non_zero(self.pool.socket_connect_timeout) {
                    async_config = async_config.set_connection_timeout(timeout);
                }
                let conn = client
                    .get_multiplexed_async_connection_with_config(&async_config)
                    .await?;
                Ok(AsyncRedisConnection::Node(conn))
            }
            ClientHandle::Cluster(client) => {
                debug!("opening async cluster connection");
                Ok(AsyncRedisConnection::Cluster(client.get_async_connection().await?))
            }
        }
    }
}

impl std::fmt::Debug for RedisClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.handle {
            ClientHandle::Node(_) => "node",
            ClientHandle::Cluster(_) => "cluster",
        };
        f.debug_struct("RedisClient")
            .field("mode", &self.mode)
            .field("handle", &kind)
            .field("pool", &self.pool)
            .finish()
    }
}

fn non_zero(timeout: Duration) -> Option<Duration> {
    (!timeout.is_zero()).then_some(timeout)
}

/// Blocking connection to a node or a cluster.
pub enum RedisConnection {
    Node(redis::Connection),
    Cluster(ClusterConnection),
}

impl ConnectionLike for RedisConnection {
    fn req_packed_command(&mut self, cmd: &[u8]) -> RedisResult<Value> {
        match self {
            RedisConnection::Node(conn) => conn.req_packed_command(cmd),
            RedisConnection::Cluster(conn) => conn.req_packed_command(cmd),
        }
    }

    fn req_packed_commands(
        &mut self,
        cmd: &[u8],
        offset: usize,
        count: usize,
    ) -> RedisResult<Vec<Value>> {
        match self {
            RedisConnection::Node(conn) => conn.req_packed_commands(cmd, offset, count),
            RedisConnection::Cluster(conn) => conn.req_packed_commands(cmd, offset, count),
        }
    }

    // Cluster routing happens in `req_command`, so it must be forwarded too.
    fn req_command(&mut self, cmd: &Cmd) -> RedisResult<Value> {
        match self {
            RedisConnection::Node(conn) => conn.req_command(cmd),
            RedisConnection::Cluster(conn) => conn.req_command(cmd),
        }
    }

    fn get_db(&self) -> i64 {
        match self {
            RedisConnection::Node(conn) => conn.get_db(),
            RedisConnection::Cluster(conn) => conn.get_db(),
        }
    }

    fn supports_pipelining(&self) -> bool {
        match self {
            RedisConnection::Node(conn) => conn.supports_pipelining(),
            RedisConnection::Cluster(conn) => conn.supports_pipelining(),
        }
    }

    fn check_connection(&mut self) -> bool {
        match self {
            RedisConnection::Node(conn) => conn.check_connection(),
            RedisConnection::Cluster(conn) => conn.check_connection(),
        }
    }

    fn is_open(&self) -> bool {
        match self {
            RedisConnection::Node(conn) => conn.is_open(),
            RedisConnection::Cluster(conn) => conn.is_open(),
        }
    }
}

/// Multiplexed async connection to a node or a cluster.
#[derive(Clone)]
pub enum AsyncRedisConnection {
    Node(MultiplexedConnection),
    Cluster(redis::cluster_async::ClusterConnection),
}

impl AsyncConnectionLike for AsyncRedisConnection {
    fn req_packed_command<'a>(&'a mut self, cmd: &'a Cmd) -> RedisFuture<'a, Value> {
        match self {
            AsyncRedisConnection::Node(conn) => conn.req_packed_command(cmd),
            AsyncRedisConnection::Cluster(conn) => conn.req_packed_command(cmd),
        }
    }

    fn req_packed_commands<'a>(
        &'a mut self,
        cmd: &'a Pipeline,
        offset: usize,
        count: usize,
    ) -> RedisFuture<'a, Vec<Value>> {
        match self {
            AsyncRedisConnection::Node(conn) => conn.req_packed_commands(cmd, offset, count),
            AsyncRedisConnection::Cluster(conn) => conn.req_packed_commands(cmd, offset, count),
        }
    }

    fn get_db(&self) -> i64 {
        match self {
            AsyncRedisConnection::Node(conn) => conn.get_db(),
            AsyncRedisConnection::Cluster(conn) => conn.get_db(),
        }
    }
}
