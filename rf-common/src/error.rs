//! # Configuration Errors
//!
//! Purpose: One error type for every way a connection string or descriptor
//! can be rejected, each with a stable, distinguishing message.
//!
//! ## Design Principles
//! 1. **Single Kind**: Callers match on variants, humans read the message.
//! 2. **Fail Fast**: Nothing here is retried or recovered internally.

use thiserror::Error;

use crate::types::Mode;

/// Result alias for parsing, construction and validation.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while parsing, building or validating a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The connection string was empty.
    #[error("URI cannot be empty")]
    EmptyUri,
    /// No `scheme:` prefix could be found.
    #[error("Invalid Redis URI format: missing scheme")]
    MissingScheme,
    /// The scheme is not one of the four supported ones.
    #[error("Invalid Redis URI scheme: {0}")]
    InvalidScheme(String),
    /// Standalone URI without a network location.
    #[error("Invalid Redis URI format: missing host")]
    MissingHost,
    /// Port is not an integer in [1, 65535].
    #[error("Invalid port number")]
    InvalidPort,
    /// Path is not a non-negative database index.
    #[error("Invalid database number")]
    InvalidDatabase,
    #[error("Sentinel URI must include at least one sentinel host")]
    MissingSentinelHosts,
    #[error("Sentinel URI must include service name")]
    MissingServiceName,
    #[error("Cluster URI must include at least one node")]
    MissingClusterNodes,

    // Construction invariants.
    #[error("Port must be between 1 and 65535")]
    PortOutOfRange,
    #[error("Max connections must be at least 1")]
    MaxConnectionsTooLow,
    #[error("Socket timeout must be non-negative")]
    NegativeSocketTimeout,
    #[error("Socket connect timeout must be non-negative")]
    NegativeConnectTimeout,
    /// Unknown `ssl_cert_reqs` spelling.
    #[error("Invalid SSL certificate requirement: {0}")]
    InvalidCertReqs(String),

    // Cross-field validation.
    #[error("Host cannot be empty")]
    EmptyHost,
    #[error("Service name is required for Sentinel mode")]
    ServiceNameRequired,
    #[error("Sentinel hosts are required for Sentinel mode")]
    SentinelHostsRequired,
    #[error("Cluster nodes are required for Cluster mode")]
    ClusterNodesRequired,
    #[error("SSL certificate requirements must be specified when SSL is enabled")]
    CertReqsRequired,

    /// An override names a field that the final mode does not carry.
    #[error("Field `{field}` does not apply to {mode} mode")]
    FieldNotApplicable { field: &'static str, mode: Mode },
    /// A builder was handed a descriptor for another topology.
    #[error("Configuration must be for {expected} mode")]
    ModeMismatch { expected: Mode, actual: Mode },
}
