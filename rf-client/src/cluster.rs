//! # Cluster Builder
//!
//! Purpose: Map a cluster descriptor onto a `redis::cluster::ClusterClient`.
//!
//! Every startup node carries the same password and TLS settings; the
//! library rejects mixed credentials among initial nodes.

use async_trait::async_trait;
use redis::cluster::ClusterClient;
use tracing::debug;

use rf_common::{ConnectionConfig, Mode};

use crate::client::{ClientHandle, FactoryResult, RedisClient};
use crate::factory::ClientBuilder;
use crate::translate::{ensure_mode, node_info, root_certificates, split_nodes};

/// Builds clients for sharded clusters.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClusterBuilder;

impl ClusterBuilder {
    fn create(&self, config: &ConnectionConfig) -> FactoryResult<RedisClient> {
        ensure_mode(config, Mode::Cluster)?;

        let nodes = split_nodes(config.cluster_nodes().unwrap_or_default(), Mode::Cluster.default_port())?;
        debug!(
            nodes = nodes.len(),
            first = %config.addr(),
            tls = config.ssl(),
            "building cluster client"
        );

        let infos: Vec<_> = nodes
            .iter()
            .map(|(host, port)| node_info(host, *port, config.password(), 0, config.tls()))
            .collect();

        let mut builder = ClusterClient::builder(infos);
        if let Some(password) = config.password() {
            builder = builder.password(password.to_string());
        }
        let pool = config.pool();
        if !pool.socket_connect_timeout.is_zero() {
            builder = builder.connection_timeout(pool.socket_connect_timeout);
        }
        if !pool.socket_timeout.is_zero() {
            builder = builder.response_timeout(pool.socket_timeout);
        }
        if let Some(certs) = root_certificates(config.tls())? {
            builder = builder.certs(certs);
        }

        Ok(RedisClient::new(
            Mode::Cluster,
            ClientHandle::Cluster(builder.build()?),
            *pool,
        ))
    }
}

#[async_trait]
impl ClientBuilder for ClusterBuilder {
    fn mode(&self) -> Mode {
        Mode::Cluster
    }

    fn build(&self, config: &ConnectionConfig) -> FactoryResult<RedisClient> {
        self.create(config)
    }

    async fn build_async(&self, config: &ConnectionConfig) -> FactoryResult<RedisClient> {
        self.create(config)
    }
}
