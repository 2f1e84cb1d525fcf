//! # Standalone Builder
//!
//! Purpose: Map a standalone descriptor onto a `redis::Client`.
//!
//! The client is lazy: no socket is opened until a connection is requested,
//! so the async path has nothing to await.

use async_trait::async_trait;
use tracing::debug;

use rf_common::{ConnectionConfig, Mode};

use crate::client::{ClientHandle, FactoryResult, RedisClient};
use crate::factory::ClientBuilder;
use crate::translate::{ensure_mode, node_info, root_certificates};

/// Builds clients for single unclustered nodes.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandaloneBuilder;

impl StandaloneBuilder {
    fn create(&self, config: &ConnectionConfig) -> FactoryResult<RedisClient> {
        ensure_mode(config, Mode::Standalone)?;

        let db = config.db().unwrap_or_default();
        let info = node_info(config.host(), config.port(), config.password(), db, config.tls());
        debug!(
            addr = %config.addr(),
            db,
            tls = config.ssl(),
            max_connections = config.max_connections(),
            "building standalone client"
        );

        let client = match root_certificates(config.tls())? {
            Some(certs) => redis::Client::build_with_tls(info, certs)?,
            None => redis::Client::open(info)?,
        };
        Ok(RedisClient::new(
            Mode::Standalone,
            ClientHandle::Node(client),
            *config.pool(),
        ))
    }
}

#[async_trait]
impl ClientBuilder for StandaloneBuilder {
    fn mode(&self) -> Mode {
        Mode::Standalone
    }

    fn build(&self, config: &ConnectionConfig) -> FactoryResult<RedisClient> {
        self.create(config)
    }

    async fn build_async(&self, config: &ConnectionConfig) -> FactoryResult<RedisClient> {
        self.create(config)
    }
}
