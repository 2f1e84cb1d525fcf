//! # Dispatch Facade
//!
//! Purpose: Map a descriptor's mode onto the builder registered for it.
//!
//! ## Design Principles
//! 1. **Strategy Pattern**: Builders implement `ClientBuilder` and can be
//!    swapped per mode without touching callers.
//! 2. **Static Registry**: The table is filled once and only read afterwards.
//! 3. **Fail Fast**: An unregistered mode is an error, never a fallback.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::debug;

use rf_common::{ConnectionConfig, Mode};

use crate::client::{FactoryError, FactoryResult, RedisClient};
use crate::cluster::ClusterBuilder;
use crate::sentinel::SentinelBuilder;
use crate::standalone::StandaloneBuilder;

/// Turns a validated descriptor into a client for one topology.
#[async_trait]
pub trait ClientBuilder: Send + Sync {
    /// Topology this builder accepts.
    fn mode(&self) -> Mode;

    /// Blocking path. Any discovery I/O blocks the calling thread.
    fn build(&self, config: &ConnectionConfig) -> FactoryResult<RedisClient>;

    /// Async path. Any discovery I/O is awaited on the current runtime.
    async fn build_async(&self, config: &ConnectionConfig) -> FactoryResult<RedisClient>;
}

/// Registry of builders keyed by mode.
#[derive(Default)]
pub struct ClientFactory {
    builders: HashMap<Mode, Box<dyn ClientBuilder>>,
}

impl ClientFactory {
    /// Creates an empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a factory with the standalone, sentinel and cluster builders.
    pub fn with_default_builders() -> Self {
        let mut factory = Self::new();
        factory.register_builder(Mode::Standalone, StandaloneBuilder);
        factory.register_builder(Mode::Sentinel, SentinelBuilder);
        factory.register_builder(Mode::Cluster, ClusterBuilder);
        factory
    }

    /// Registers `builder` for `mode`, replacing any previous one.
    pub fn register_builder(&mut self, mode: Mode, builder: impl ClientBuilder + 'static) {
        self.builders.insert(mode, Box::new(builder));
    }

    pub fn has_builder(&self, mode: Mode) -> bool {
        self.builders.contains_key(&mode)
    }

    fn builder_for(&self, mode: Mode) -> FactoryResult<&dyn ClientBuilder> {
        self.builders
            .get(&mode)
            .map(|builder| builder.as_ref())
            .ok_or(FactoryError::NotImplemented(mode))
    }

    /// Builds a client on the blocking path.
    ///
    /// # Errors
    /// `NotImplemented` for an unregistered mode; otherwise whatever the
    /// builder returns.
    pub fn create_client(&self, config: &ConnectionConfig) -> FactoryResult<RedisClient> {
        let builder = self.builder_for(config.mode())?;
        debug!(mode = %config.mode(), "dispatching blocking client build");
        builder.build(config)
    }

    /// Builds a client on the async path.
    pub async fn create_async_client(&self, config: &ConnectionConfig) -> FactoryResult<RedisClient> {
        let builder = self.builder_for(config.mode())?;
        debug!(mode = %config.mode(), "dispatching async client build");
        builder.build_async(config).await
    }
}
