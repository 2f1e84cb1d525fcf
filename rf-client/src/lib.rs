//! # Redis Factory Client
//!
//! Purpose: Instantiate the right `redis` client for a descriptor, whether it
//! names a single node, a sentinel group or a cluster.
//!
//! ## Design Principles
//! 1. **Strategy Pattern**: One `ClientBuilder` per topology behind a registry.
//! 2. **Translation Only**: Builders map fields; pooling, discovery and the
//!    wire protocol stay inside the `redis` crate.
//! 3. **Defense in Depth**: Every builder re-checks mode and validation.
//! 4. **Both Paths**: Blocking and async construction share the same mapping.

mod client;
mod cluster;
mod factory;
mod sentinel;
mod simple;
mod standalone;
mod translate;

pub use client::{
    AsyncRedisConnection, ClientHandle, FactoryError, FactoryResult, RedisClient, RedisConnection,
};
pub use cluster::ClusterBuilder;
pub use factory::{ClientBuilder, ClientFactory};
pub use sentinel::SentinelBuilder;
pub use simple::{
    create_async_redis_client, create_redis_client, default_factory, get_async_redis_client,
    get_redis_client,
};
pub use standalone::StandaloneBuilder;

pub use rf_common;
