//! # Sentinel Builder
//!
//! Purpose: Resolve the current primary of a monitored group through the
//! `redis` crate's sentinel discovery and return a client bound to it.
//!
//! ## Design Principles
//! 1. **Library Discovery**: `master_for` / `async_master_for` do the lookup;
//!    nothing here inspects sentinel replies.
//! 2. **Split Credentials**: `password` authenticates against the resolved
//!    primary. Sentinels only see AUTH when `sentinel_password` is set.
//! 3. **Shared TLS**: Sentinels and data nodes use the same TLS settings.

use async_trait::async_trait;
use redis::sentinel::{Sentinel, SentinelNodeConnectionInfo};
use redis::RedisConnectionInfo;
use tracing::{debug, warn};

use rf_common::{ConnectionConfig, Mode};

use crate::client::{ClientHandle, FactoryResult, RedisClient};
use crate::factory::ClientBuilder;
use crate::translate::{ensure_mode, node_info, split_nodes, tls_mode};

/// Builds clients for sentinel-managed primaries.
#[derive(Debug, Default, Clone, Copy)]
pub struct SentinelBuilder;

/// Everything `master_for` needs, prepared without I/O.
struct Discovery {
    sentinel: Sentinel,
    service_name: String,
    node_info: SentinelNodeConnectionInfo,
}

impl SentinelBuilder {
    fn prepare(&self, config: &ConnectionConfig) -> FactoryResult<Discovery> {
        ensure_mode(config, Mode::Sentinel)?;

        let hosts = split_nodes(
            config.sentinel_hosts().unwrap_or_default(),
            Mode::Sentinel.default_port(),
        )?;
        let service_name = config.service_name().unwrap_or_default().to_string();
        debug!(
            sentinels = hosts.len(),
            service = %service_name,
            tls = config.ssl(),
            "resolving primary through sentinels"
        );
        if config.ssl_ca_certs().is_some() {
            warn!("custom CA bundle is not applied to sentinel-resolved connections");
        }

        let infos: Vec<_> = hosts
            .iter()
            .map(|(host, port)| node_info(host, *port, config.sentinel_password(), 0, config.tls()))
            .collect();
        let sentinel = Sentinel::build(infos)?;

        let node_info = SentinelNodeConnectionInfo {
            tls_mode: tls_mode(config.tls()),
            redis_connection_info: Some(RedisConnectionInfo {
                password: config.password().map(str::to_string),
                ..Default::default()
            }),
        };

        Ok(Discovery {
            sentinel,
            service_name,
            node_info,
        })
    }
}

#[async_trait]
impl ClientBuilder for SentinelBuilder {
    fn mode(&self) -> Mode {
        Mode::Sentinel
    }

    fn build(&self, config: &ConnectionConfig) -> FactoryResult<RedisClient> {
        let mut discovery = self.prepare(config)?;
        let client = discovery
            .sentinel
            .master_for(&discovery.service_name, Some(&discovery.node_info))?;
        Ok(RedisClient::new(
            Mode::Sentinel,
            ClientHandle::Node(client),
            *config.pool(),
        ))
    }

    async fn build_async(&self, config: &ConnectionConfig) -> FactoryResult<RedisClient> {
        let mut discovery = self.prepare(config)?;
        let client = discovery
            .sentinel
            .async_master_for(&discovery.service_name, Some(&discovery.node_info))
            .await?;
        Ok(RedisClient::new(
            Mode::Sentinel,
            ClientHandle::Node(client),
            *config.pool(),
        ))
    }
}
