//! # Connection Descriptor
//!
//! Purpose: Capture every parameter needed to reach a Redis deployment in a
//! single immutable value.
//!
//! ## Design Principles
//!
//! 1. **Variant-Owned Fields**: `Topology` is a sum type. Each variant carries
//!    only the fields meaningful for its mode, so a standalone descriptor can
//!    never hold a stale sentinel list.
//! 2. **Invariants at Construction**: `ConnectionConfigBuilder::build` rejects
//!    port 0 and an empty pool. Negative db and timeouts are ruled out by the
//!    types (`u32`, `Duration`).
//! 3. **Deferred Mode Checks**: Mode-required fields (service name, node
//!    lists) are checked by `validate_config` and again by every builder, so
//!    defaults can be built first and filled in later.
//! 4. **Secret Hygiene**: `Debug` and `Serialize` redact passwords.
//!
//! ## Field Layout
//!
//! ```text
//! ConnectionConfig
//! +------+------+----------+--------------------------------------------+
//! | host | port | password | topology                                   |
//! +------+------+----------+--------------------------------------------+
//!                          | Standalone { db }                          |
//!                          | Sentinel { sentinel_hosts, sentinel_password,
//!                          |            service_name }                  |
//!                          | Cluster { cluster_nodes }                  |
//!                          +--------------------------------------------+
//! | pool: max_connections, socket_timeout, socket_connect_timeout       |
//! | tls:  ssl, ssl_cert_reqs, ssl_ca_certs                              |
//! +---------------------------------------------------------------------+
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::{ConfigError, ConfigResult};

/// Host used when a URI or default descriptor names none.
pub const DEFAULT_HOST: &str = "localhost";

/// Default port for data nodes (standalone and cluster).
pub const DEFAULT_PORT: u16 = 6379;

/// Default port for sentinel processes.
pub const DEFAULT_SENTINEL_PORT: u16 = 26379;

/// Default upper bound for pooled connections.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Default read/write and connect timeout.
pub const DEFAULT_SOCKET_TIMEOUT: Duration = Duration::from_secs(5);

const REDACTED: &str = "***";

/// Deployment topology discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Single unclustered node.
    #[default]
    Standalone,
    /// Primary discovered through a sentinel group.
    Sentinel,
    /// Sharded cluster.
    Cluster,
}

impl Mode {
    /// Lowercase name, as used in serialized output and CLI flags.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Mode::Standalone => "standalone",
            Mode::Sentinel => "sentinel",
            Mode::Cluster => "cluster",
        }
    }

    /// Port assumed for host fragments that carry none.
    pub const fn default_port(&self) -> u16 {
        match self {
            Mode::Sentinel => DEFAULT_SENTINEL_PORT,
            Mode::Standalone | Mode::Cluster => DEFAULT_PORT,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standalone" => Ok(Mode::Standalone),
            "sentinel" => Ok(Mode::Sentinel),
            "cluster" => Ok(Mode::Cluster),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

/// Server certificate verification policy for TLS connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertReqs {
    /// Certificate must be present and valid.
    Required,
    /// Certificate is checked when offered; not enforced.
    Optional,
    /// No verification.
    None,
}

impl CertReqs {
    pub const fn as_str(&self) -> &'static str {
        match self {
            CertReqs::Required => "required",
            CertReqs::Optional => "optional",
            CertReqs::None => "none",
        }
    }

    /// Returns true when the server certificate chain is enforced.
    #[inline]
    pub const fn verifies(&self) -> bool {
        matches!(self, CertReqs::Required)
    }
}

impl fmt::Display for CertReqs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CertReqs {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "required" | "cert_required" => Ok(CertReqs::Required),
            "optional" | "cert_optional" => Ok(CertReqs::Optional),
            "none" | "cert_none" => Ok(CertReqs::None),
            _ => Err(ConfigError::InvalidCertReqs(s.to_string())),
        }
    }
}

/// Mode plus the fields that only make sense for that mode.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Topology {
    Standalone {
        /// Logical database index.
        db: u32,
    },
    Sentinel {
        /// Ordered `host:port` list of sentinel processes.
        sentinel_hosts: Vec<String>,
        /// Credential for the sentinels themselves.
        #[serde(serialize_with = "redact")]
        sentinel_password: Option<String>,
        /// Name of the monitored primary group.
        service_name: Option<String>,
    },
    Cluster {
        /// Ordered `host:port` list of startup nodes.
        cluster_nodes: Vec<String>,
    },
}

impl Topology {
    /// Returns a topology for `mode` with every mode-specific field unset.
    pub fn empty(mode: Mode) -> Self {
        match mode {
            Mode::Standalone => Topology::Standalone { db: 0 },
            Mode::Sentinel => Topology::Sentinel {
                sentinel_hosts: Vec::new(),
                sentinel_password: None,
                service_name: None,
            },
            Mode::Cluster => Topology::Cluster {
                cluster_nodes: Vec::new(),
            },
        }
    }

    #[inline]
    pub fn mode(&self) -> Mode {
        match self {
            Topology::Standalone { .. } => Mode::Standalone,
            Topology::Sentinel { .. } => Mode::Sentinel,
            Topology::Cluster { .. } => Mode::Cluster,
        }
    }
}

impl Default for Topology {
    fn default() -> Self {
        Topology::empty(Mode::Standalone)
    }
}

impl fmt::Debug for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topology::Standalone { db } => f.debug_struct("Standalone").field("db", db).finish(),
            Topology::Sentinel {
                sentinel_hosts,
                sentinel_password,
                service_name,
            } => f
                .debug_struct("Sentinel")
                .field("sentinel_hosts", sentinel_hosts)
                .field("sentinel_password", &sentinel_password.as_ref().map(|_| REDACTED))
                .field("service_name", service_name)
                .finish(),
            Topology::Cluster { cluster_nodes } => f
                .debug_struct("Cluster")
                .field("cluster_nodes", cluster_nodes)
                .finish(),
        }
    }
}

/// Pool size and socket timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolSettings {
    /// Upper bound on connections kept by the client (≥ 1).
    pub max_connections: u32,
    /// Read/write timeout. Zero disables it.
    #[serde(serialize_with = "as_secs_f64")]
    pub socket_timeout: Duration,
    /// Connect timeout. Zero disables it.
    #[serde(serialize_with = "as_secs_f64")]
    pub socket_connect_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        PoolSettings {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            socket_timeout: DEFAULT_SOCKET_TIMEOUT,
            socket_connect_timeout: DEFAULT_SOCKET_TIMEOUT,
        }
    }
}

/// TLS switches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TlsSettings {
    #[serde(rename = "ssl")]
    pub enabled: bool,
    #[serde(rename = "ssl_cert_reqs")]
    pub cert_reqs: Option<CertReqs>,
    /// PEM bundle of trusted roots.
    #[serde(rename = "ssl_ca_certs")]
    pub ca_certs: Option<PathBuf>,
}

/// Everything needed to reach one Redis deployment.
///
/// Built through [`ConnectionConfig::builder`], [`crate::parse_redis_uri`] or
/// [`crate::default_config`]; never mutated in place afterwards.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionConfig {
    pub(crate) host: String,
    pub(crate) port: u16,
    #[serde(serialize_with = "redact")]
    pub(crate) password: Option<String>,
    #[serde(flatten)]
    pub(crate) topology: Topology,
    #[serde(flatten)]
    pub(crate) pool: PoolSettings,
    #[serde(flatten)]
    pub(crate) tls: TlsSettings,
}

impl ConnectionConfig {
    /// Starts a builder seeded with the default-construction values.
    pub fn builder() -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::default()
    }

    /// Returns a builder holding a copy of this descriptor.
    pub fn to_builder(&self) -> ConnectionConfigBuilder {
        ConnectionConfigBuilder {
            host: self.host.clone(),
            port: self.port,
            password: self.password.clone(),
            topology: self.topology.clone(),
            pool: self.pool,
            tls: self.tls.clone(),
        }
    }

    #[inline]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[inline]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns `host:port` of the default node.
    pub fn addr(&self) -> String {
        format_host_port(&self.host, self.port)
    }

    #[inline]
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    #[inline]
    pub fn mode(&self) -> Mode {
        self.topology.mode()
    }

    #[inline]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Database index; `None` outside standalone mode.
    pub fn db(&self) -> Option<u32> {
        match self.topology {
            Topology::Standalone { db } => Some(db),
            _ => None,
        }
    }

    /// Sentinel list; `None` outside sentinel mode.
    pub fn sentinel_hosts(&self) -> Option<&[String]> {
        match &self.topology {
            Topology::Sentinel { sentinel_hosts, .. } => Some(sentinel_hosts),
            _ => None,
        }
    }

    pub fn sentinel_password(&self) -> Option<&str> {
        match &self.topology {
            Topology::Sentinel {
                sentinel_password, ..
            } => sentinel_password.as_deref(),
            _ => None,
        }
    }

    pub fn service_name(&self) -> Option<&str> {
        match &self.topology {
            Topology::Sentinel { service_name, .. } => service_name.as_deref(),
            _ => None,
        }
    }

    /// Cluster startup nodes; `None` outside cluster mode.
    pub fn cluster_nodes(&self) -> Option<&[String]> {
        match &self.topology {
            Topology::Cluster { cluster_nodes } => Some(cluster_nodes),
            _ => None,
        }
    }

    #[inline]
    pub fn pool(&self) -> &PoolSettings {
        &self.pool
    }

    #[inline]
    pub fn max_connections(&self) -> u32 {
        self.pool.max_connections
    }

    #[inline]
    pub fn socket_timeout(&self) -> Duration {
        self.pool.socket_timeout
    }

    #[inline]
    pub fn socket_connect_timeout(&self) -> Duration {
        self.pool.socket_connect_timeout
    }

    #[inline]
    pub fn tls(&self) -> &TlsSettings {
        &self.tls
    }

    #[inline]
    pub fn ssl(&self) -> bool {
        self.tls.enabled
    }

    #[inline]
    pub fn ssl_cert_reqs(&self) -> Option<CertReqs> {
        self.tls.cert_reqs
    }

    pub fn ssl_ca_certs(&self) -> Option<&Path> {
        self.tls.ca_certs.as_deref()
    }

    /// Renders the descriptor as a connection string.
    ///
    /// Only fields expressible in the URI grammar are emitted: pool, timeout
    /// and CA settings are dropped. Parsing the result yields the same host
    /// list order, service name, db and password.
    pub fn to_uri(&self) -> String {
        let password = self.password().or(self.sentinel_password());
        let auth = password.map(|pw| format!(":{pw}@")).unwrap_or_default();
        match &self.topology {
            Topology::Standalone { db } => {
                let scheme = if self.tls.enabled { "rediss" } else { "redis" };
                format!("{scheme}://{auth}{}/{db}", self.addr())
            }
            Topology::Sentinel {
                sentinel_hosts,
                service_name,
                ..
            } => {
                let path = service_name
                    .as_deref()
                    .map(|name| format!("/{name}"))
                    .unwrap_or_default();
                format!("redis+sentinel://{auth}{}{path}", sentinel_hosts.join(","))
            }
            Topology::Cluster { cluster_nodes } => {
                format!("redis+cluster://{auth}{}", cluster_nodes.join(","))
            }
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| REDACTED))
            .field("topology", &self.topology)
            .field("pool", &self.pool)
            .field("tls", &self.tls)
            .finish()
    }
}

impl Default for ConnectionConfig {
    /// Standalone `localhost:6379`, db 0, no password, no TLS.
    fn default() -> Self {
        let ConnectionConfigBuilder {
            host,
            port,
            password,
            topology,
            pool,
            tls,
        } = ConnectionConfigBuilder::default();
        ConnectionConfig {
            host,
            port,
            password,
            topology,
            pool,
            tls,
        }
    }
}

/// Builder enforcing the construction invariants of [`ConnectionConfig`].
#[derive(Debug, Clone)]
pub struct ConnectionConfigBuilder {
    host: String,
    port: u16,
    password: Option<String>,
    topology: Topology,
    pool: PoolSettings,
    tls: TlsSettings,
}

impl Default for ConnectionConfigBuilder {
    fn default() -> Self {
        ConnectionConfigBuilder {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            password: None,
            topology: Topology::default(),
            pool: PoolSettings::default(),
            tls: TlsSettings::default(),
        }
    }
}

impl ConnectionConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn password(mut self, password: Option<String>) -> Self {
        self.password = password;
        self
    }

    pub fn topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }

    /// Standalone topology with the given database index.
    pub fn standalone(self, db: u32) -> Self {
        self.topology(Topology::Standalone { db })
    }

    /// Sentinel topology; the sentinel password starts unset.
    pub fn sentinel(self, sentinel_hosts: Vec<String>, service_name: impl Into<String>) -> Self {
        self.topology(Topology::Sentinel {
            sentinel_hosts,
            sentinel_password: None,
            service_name: Some(service_name.into()),
        })
    }

    pub fn cluster(self, cluster_nodes: Vec<String>) -> Self {
        self.topology(Topology::Cluster { cluster_nodes })
    }

    pub fn max_connections(mut self, max_connections: u32) -> Self {
        self.pool.max_connections = max_connections;
        self
    }

    pub fn socket_timeout(mut self, timeout: Duration) -> Self {
        self.pool.socket_timeout = timeout;
        self
    }

    pub fn socket_connect_timeout(mut self, timeout: Duration) -> Self {
        self.pool.socket_connect_timeout = timeout;
        self
    }

    pub fn ssl(mut self, enabled: bool) -> Self {
        self.tls.enabled = enabled;
        self
    }

    pub fn ssl_cert_reqs(mut self, cert_reqs: Option<CertReqs>) -> Self {
        self.tls.cert_reqs = cert_reqs;
        self
    }

    pub fn ssl_ca_certs(mut self, path: Option<PathBuf>) -> Self {
        self.tls.ca_certs = path;
        self
    }

    /// Checks the construction invariants and freezes the descriptor.
    ///
    /// # Errors
    /// `PortOutOfRange` for port 0, `MaxConnectionsTooLow` for an empty pool.
    pub fn build(self) -> ConfigResult<ConnectionConfig> {
        if self.port == 0 {
            return Err(ConfigError::PortOutOfRange);
        }
        if self.pool.max_connections < 1 {
            return Err(ConfigError::MaxConnectionsTooLow);
        }

        Ok(ConnectionConfig {
            host: self.host,
            port: self.port,
            password: self.password,
            topology: self.topology,
            pool: self.pool,
            tls: self.tls,
        })
    }
}

/// Formats `host:port`, bracketing IPv6 literals.
pub fn format_host_port(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

/// Converts float seconds into a `Duration`, rejecting negatives and NaN.
pub fn duration_from_secs(secs: f64, err: ConfigError) -> ConfigResult<Duration> {
    Duration::try_from_secs_f64(secs).map_err(|_| err)
}

fn redact<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(_) => serializer.serialize_some(REDACTED),
        None => serializer.serialize_none(),
    }
}

fn as_secs_f64<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.as_secs_f64())
}
