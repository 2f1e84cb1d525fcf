//! # Configuration Utilities
//!
//! Purpose: Build descriptors from defaults, apply caller overrides, merge
//! two descriptors and run the cross-field checks that construction skips.
//!
//! ## Design Principles
//! 1. **Explicit Absence**: `ConfigOverrides` wraps every field in `Option`,
//!    so "not supplied" and "supplied the default" stay distinguishable.
//! 2. **Right-Biased Merge**: `merge_configs` is shallow and field-wise; a
//!    descriptor has no nested mutable state to reconcile.
//! 3. **Pure Validation**: `validate_config` borrows and never mutates.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};
use crate::types::{
    duration_from_secs, CertReqs, ConnectionConfig, Mode, PoolSettings, Topology, DEFAULT_HOST,
    DEFAULT_PORT,
};
use crate::uri::parse_redis_uri;

/// Returns a descriptor holding the defaults for `mode` (standalone if `None`).
///
/// Mode-specific fields are left unset so `validate_config` forces the caller
/// to supply them before a client is built.
pub fn default_config(mode: Option<Mode>) -> ConnectionConfig {
    ConnectionConfig {
        host: DEFAULT_HOST.to_string(),
        port: DEFAULT_PORT,
        password: None,
        topology: Topology::empty(mode.unwrap_or_default()),
        pool: PoolSettings::default(),
        tls: Default::default(),
    }
}

/// Named field overrides; only `Some` fields are applied.
///
/// Deserializes from JSON with float-second timeouts:
///
/// ```json
/// { "max_connections": 20, "socket_timeout": 10.0, "password": "s3cret" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub password: Option<String>,
    /// Switches the topology. Fields of the previous mode are dropped.
    pub mode: Option<Mode>,
    pub db: Option<u32>,
    pub sentinel_hosts: Option<Vec<String>>,
    pub sentinel_password: Option<String>,
    pub service_name: Option<String>,
    pub cluster_nodes: Option<Vec<String>>,
    pub max_connections: Option<u32>,
    /// Seconds.
    pub socket_timeout: Option<f64>,
    /// Seconds.
    pub socket_connect_timeout: Option<f64>,
    pub ssl: Option<bool>,
    pub ssl_cert_reqs: Option<CertReqs>,
    pub ssl_ca_certs: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Returns true when no field is set.
    pub fn is_empty(&self) -> bool {
        *self == ConfigOverrides::default()
    }

    /// Applies every set field on top of `base`, re-checking invariants.
    ///
    /// # Errors
    /// Construction errors (`PortOutOfRange`, negative timeouts, ...) and
    /// `FieldNotApplicable` when a topology field does not match the final
    /// mode.
    pub fn apply(&self, base: &ConnectionConfig) -> ConfigResult<ConnectionConfig> {
        let mut topology = base.topology.clone();
        if let Some(mode) = self.mode {
            if mode != topology.mode() {
                topology = Topology::empty(mode);
            }
        }
        self.apply_topology(&mut topology)?;

        let mut builder = base.to_builder().topology(topology);
        if let Some(host) = &self.host {
            builder = builder.host(host.clone());
        }
        if let Some(port) = self.port {
            builder = builder.port(port);
        }
        if let Some(password) = &self.password {
            builder = builder.password(Some(password.clone()));
        }
        if let Some(max_connections) = self.max_connections {
            builder = builder.max_connections(max_connections);
        }
        if let Some(secs) = self.socket_timeout {
            builder = builder
                .socket_timeout(duration_from_secs(secs, ConfigError::NegativeSocketTimeout)?);
        }
        if let Some(secs) = self.socket_connect_timeout {
            builder = builder.socket_connect_timeout(duration_from_secs(
                secs,
                ConfigError::NegativeConnectTimeout,
            )?);
        }
        if let Some(ssl) = self.ssl {
            builder = builder.ssl(ssl);
        }
        if let Some(cert_reqs) = self.ssl_cert_reqs {
            builder = builder.ssl_cert_reqs(Some(cert_reqs));
        }
        if let Some(path) = &self.ssl_ca_certs {
            builder = builder.ssl_ca_certs(Some(path.clone()));
        }
        builder.build()
    }

    fn apply_topology(&self, topology: &mut Topology) -> ConfigResult<()> {
        let mode = topology.mode();
        let not_applicable = |field| ConfigError::FieldNotApplicable { field, mode };

        match topology {
            Topology::Standalone { db } => {
                if let Some(value) = self.db {
                    *db = value;
                }
            }
            Topology::Sentinel {
                sentinel_hosts,
                sentinel_password,
                service_name,
            } => {
                if let Some(hosts) = &self.sentinel_hosts {
                    sentinel_hosts.clone_from(hosts);
                }
                if let Some(password) = &self.sentinel_password {
                    *sentinel_password = Some(password.clone());
                }
                if let Some(name) = &self.service_name {
                    *service_name = Some(name.clone());
                }
            }
            Topology::Cluster { cluster_nodes } => {
                if let Some(nodes) = &self.cluster_nodes {
                    cluster_nodes.clone_from(nodes);
                }
            }
        }

        // Anything left over names a field the final mode does not have.
        let stray = [
            ("db", self.db.is_some(), Mode::Standalone),
            ("sentinel_hosts", self.sentinel_hosts.is_some(), Mode::Sentinel),
            ("sentinel_password", self.sentinel_password.is_some(), Mode::Sentinel),
            ("service_name", self.service_name.is_some(), Mode::Sentinel),
            ("cluster_nodes", self.cluster_nodes.is_some(), Mode::Cluster),
        ];
        match stray
            .into_iter()
            .find(|(_, set, owner)| *set && *owner != mode)
        {
            Some((field, _, _)) => Err(not_applicable(field)),
            None => Ok(()),
        }
    }
}

/// Parses `uri`, applies `overrides`, then runs [`validate_config`].
///
/// Stricter than [`parse_redis_uri`]: mode-required fields are enforced here.
///
/// # Examples
/// ```rust
/// use rf_common::{create_config_from_uri, ConfigOverrides};
///
/// let overrides = ConfigOverrides {
///     max_connections: Some(20),
///     socket_timeout: Some(10.0),
///     ..Default::default()
/// };
/// let config = create_config_from_uri("redis://localhost:6379", &overrides).unwrap();
/// assert_eq!(config.max_connections(), 20);
/// ```
pub fn create_config_from_uri(
    uri: &str,
    overrides: &ConfigOverrides,
) -> ConfigResult<ConnectionConfig> {
    let parsed = parse_redis_uri(uri)?;
    let config = if overrides.is_empty() {
        parsed
    } else {
        overrides.apply(&parsed)?
    };
    validate_config(&config)?;
    Ok(config)
}

/// Merges `override_config` onto `base`, field by field.
///
/// A field of `override_config` wins unless it is unset or equal to the
/// [`default_config`] value, in which case the base value is kept. Use
/// [`ConfigOverrides::apply`] to force a default (for example `db = 0`).
///
/// The mode of `override_config` wins when it is not standalone. With equal
/// modes the mode-specific fields merge individually; with different modes
/// the override's topology replaces the base one. A standalone override on a
/// sentinel or cluster base keeps the base's `host` and `port` as well.
pub fn merge_configs(base: &ConnectionConfig, override_config: &ConnectionConfig) -> ConnectionConfig {
    let defaults = PoolSettings::default();
    let pick = |ours: u32, theirs: u32, default: u32| if theirs != default { theirs } else { ours };

    // host/port mirror the first node of a kept sentinel or cluster list.
    let keeps_base_topology =
        override_config.mode() == Mode::Standalone && base.mode() != Mode::Standalone;
    let host = if override_config.host != DEFAULT_HOST && !keeps_base_topology {
        override_config.host.clone()
    } else {
        base.host.clone()
    };
    let port = if override_config.port != DEFAULT_PORT && !keeps_base_topology {
        override_config.port
    } else {
        base.port
    };

    let pool = PoolSettings {
        max_connections: pick(
            base.pool.max_connections,
            override_config.pool.max_connections,
            defaults.max_connections,
        ),
        socket_timeout: if override_config.pool.socket_timeout != defaults.socket_timeout {
            override_config.pool.socket_timeout
        } else {
            base.pool.socket_timeout
        },
        socket_connect_timeout: if override_config.pool.socket_connect_timeout
            != defaults.socket_connect_timeout
        {
            override_config.pool.socket_connect_timeout
        } else {
            base.pool.socket_connect_timeout
        },
    };

    let mut tls = base.tls.clone();
    tls.enabled |= override_config.tls.enabled;
    if override_config.tls.cert_reqs.is_some() {
        tls.cert_reqs = override_config.tls.cert_reqs;
    }
    if override_config.tls.ca_certs.is_some() {
        tls.ca_certs.clone_from(&override_config.tls.ca_certs);
    }

    ConnectionConfig {
        host,
        port,
        password: override_config
            .password
            .clone()
            .or_else(|| base.password.clone()),
        topology: merge_topology(&base.topology, &override_config.topology),
        pool,
        tls,
    }
}

fn merge_topology(base: &Topology, theirs: &Topology) -> Topology {
    match (base, theirs) {
        (Topology::Standalone { db: ours }, Topology::Standalone { db }) => Topology::Standalone {
            db: pick_u32(*ours, *db),
        },
        // A standalone override carries the default mode: the base mode stays.
        (_, Topology::Standalone { .. }) => base.clone(),
        (
            Topology::Sentinel {
                sentinel_hosts: base_hosts,
                sentinel_password: base_password,
                service_name: base_service,
            },
            Topology::Sentinel {
                sentinel_hosts,
                sentinel_password,
                service_name,
            },
        ) => Topology::Sentinel {
            sentinel_hosts: non_empty_or(sentinel_hosts, base_hosts),
            sentinel_password: sentinel_password.clone().or_else(|| base_password.clone()),
            service_name: service_name.clone().or_else(|| base_service.clone()),
        },
        (
            Topology::Cluster {
                cluster_nodes: base_nodes,
            },
            Topology::Cluster { cluster_nodes },
        ) => Topology::Cluster {
            cluster_nodes: non_empty_or(cluster_nodes, base_nodes),
        },
        (_, other) => other.clone(),
    }
}

fn pick_u32(ours: u32, theirs: u32) -> u32 {
    if theirs != 0 {
        theirs
    } else {
        ours
    }
}

fn non_empty_or(theirs: &[String], ours: &[String]) -> Vec<String> {
    if theirs.is_empty() {
        ours.to_vec()
    } else {
        theirs.to_vec()
    }
}

/// Cross-field checks beyond the construction invariants.
///
/// # Errors
/// `EmptyHost`, `ServiceNameRequired`, `SentinelHostsRequired`,
/// `ClusterNodesRequired` or `CertReqsRequired`.
pub fn validate_config(config: &ConnectionConfig) -> ConfigResult<()> {
    if config.host.trim().is_empty() {
        return Err(ConfigError::EmptyHost);
    }

    match &config.topology {
        Topology::Standalone { .. } => {}
        Topology::Sentinel {
            sentinel_hosts,
            service_name,
            ..
        } => {
            if service_name.as_deref().map_or(true, str::is_empty) {
                return Err(ConfigError::ServiceNameRequired);
            }
            if sentinel_hosts.is_empty() {
                return Err(ConfigError::SentinelHostsRequired);
            }
        }
        Topology::Cluster { cluster_nodes } => {
            if cluster_nodes.is_empty() {
                return Err(ConfigError::ClusterNodesRequired);
            }
        }
    }

    if config.tls.enabled && config.tls.cert_reqs.is_none() {
        return Err(ConfigError::CertReqsRequired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn sentinel_config(hosts: Vec<String>, service_name: Option<&str>) -> ConnectionConfig {
        ConnectionConfig::builder()
            .topology(Topology::Sentinel {
                sentinel_hosts: hosts,
                sentinel_password: None,
                service_name: service_name.map(str::to_string),
            })
            .build()
            .unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = default_config(None);
        assert_eq!(config.host(), "localhost");
        assert_eq!(config.port(), 6379);
        assert_eq!(config.db(), Some(0));
        assert_eq!(config.mode(), Mode::Standalone);
        assert_eq!(config.max_connections(), 10);
        assert_eq!(config.socket_timeout(), Duration::from_secs(5));
        assert_eq!(config.socket_connect_timeout(), Duration::from_secs(5));
        assert!(!config.ssl());
        assert_eq!(config, ConnectionConfig::builder().build().unwrap());
    }

    #[test]
    fn test_default_config_leaves_mode_fields_unset() {
        let config = default_config(Some(Mode::Sentinel));
        assert_eq!(config.mode(), Mode::Sentinel);
        assert!(config.sentinel_hosts().unwrap().is_empty());
        assert_eq!(config.service_name(), None);
        assert_eq!(validate_config(&config), Err(ConfigError::ServiceNameRequired));

        let config = default_config(Some(Mode::Cluster));
        assert_eq!(validate_config(&config), Err(ConfigError::ClusterNodesRequired));
    }

    #[test]
    fn test_create_config_from_uri_with_overrides() {
        let overrides = ConfigOverrides {
            host: Some("redis.example.com".into()),
            port: Some(6380),
            password: Some("secret".into()),
            db: Some(1),
            max_connections: Some(20),
            socket_timeout: Some(10.0),
            ..Default::default()
        };
        let config = create_config_from_uri("redis://localhost:6379", &overrides).unwrap();
        assert_eq!(config.host(), "redis.example.com");
        assert_eq!(config.port(), 6380);
        assert_eq!(config.password(), Some("secret"));
        assert_eq!(config.db(), Some(1));
        assert_eq!(config.max_connections(), 20);
        assert_eq!(config.socket_timeout(), Duration::from_secs(10));
        // Untouched fields keep the parsed value.
        assert_eq!(config.socket_connect_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_create_config_from_uri_validates() {
        let overrides = ConfigOverrides {
            ssl: Some(true),
            ..Default::default()
        };
        assert_eq!(
            create_config_from_uri("redis://localhost", &overrides).unwrap_err(),
            ConfigError::CertReqsRequired
        );

        let overrides = ConfigOverrides {
            mode: Some(Mode::Cluster),
            ..Default::default()
        };
        assert_eq!(
            create_config_from_uri("redis://localhost", &overrides).unwrap_err(),
            ConfigError::ClusterNodesRequired
        );
    }

    #[test]
    fn test_overrides_reject_bad_values() {
        let base = default_config(None);
        let bad_timeout = ConfigOverrides {
            socket_connect_timeout: Some(-0.5),
            ..Default::default()
        };
        assert_eq!(
            bad_timeout.apply(&base).unwrap_err().to_string(),
            "Socket connect timeout must be non-negative"
        );

        let bad_port = ConfigOverrides {
            port: Some(0),
            ..Default::default()
        };
        assert_eq!(bad_port.apply(&base), Err(ConfigError::PortOutOfRange));

        let stray = ConfigOverrides {
            cluster_nodes: Some(vec!["n1:7000".into()]),
            ..Default::default()
        };
        assert_eq!(
            stray.apply(&base),
            Err(ConfigError::FieldNotApplicable {
                field: "cluster_nodes",
                mode: Mode::Standalone,
            })
        );
    }

    #[test]
    fn test_overrides_switch_mode() {
        let overrides = ConfigOverrides {
            mode: Some(Mode::Sentinel),
            sentinel_hosts: Some(vec!["s1:26379".into()]),
            service_name: Some("mymaster".into()),
            ..Default::default()
        };
        let config = overrides.apply(&default_config(None)).unwrap();
        assert_eq!(config.mode(), Mode::Sentinel);
        assert_eq!(config.service_name(), Some("mymaster"));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_overrides_can_force_default_db() {
        let base = parse_redis_uri("redis://localhost/5").unwrap();
        let overrides = ConfigOverrides {
            db: Some(0),
            ..Default::default()
        };
        assert_eq!(overrides.apply(&base).unwrap().db(), Some(0));
        // The descriptor merge cannot express this.
        assert_eq!(merge_configs(&base, &default_config(None)).db(), Some(5));
    }

    #[test]
    fn test_overrides_from_json() {
        let overrides: ConfigOverrides = serde_json::from_str(
            r#"{"max_connections": 20, "socket_timeout": 10.0, "mode": "cluster", "ssl_cert_reqs": "none"}"#,
        )
        .unwrap();
        assert_eq!(overrides.max_connections, Some(20));
        assert_eq!(overrides.mode, Some(Mode::Cluster));
        assert_eq!(overrides.ssl_cert_reqs, Some(CertReqs::None));
        assert!(serde_json::from_str::<ConfigOverrides>(r#"{"hots": "x"}"#).is_err());
    }

    #[test]
    fn test_merge_configs_basic() {
        let base = ConnectionConfig::builder()
            .max_connections(15)
            .password(Some("base_password".into()))
            .build()
            .unwrap();
        let theirs = ConnectionConfig::builder()
            .host("redis.example.com")
            .port(6380)
            .build()
            .unwrap();

        let merged = merge_configs(&base, &theirs);
        assert_eq!(merged.host(), "redis.example.com");
        assert_eq!(merged.port(), 6380);
        assert_eq!(merged.password(), Some("base_password"));
        assert_eq!(merged.max_connections(), 15);
    }

    #[test]
    fn test_merge_configs_override_wins_on_set_fields() {
        let base = parse_redis_uri("redis://:old@cache:6390/3").unwrap();
        let theirs = ConnectionConfig::builder()
            .password(Some("new".into()))
            .standalone(7)
            .max_connections(30)
            .socket_timeout(Duration::from_secs(1))
            .ssl(true)
            .ssl_cert_reqs(Some(CertReqs::Optional))
            .build()
            .unwrap();

        let merged = merge_configs(&base, &theirs);
        assert_eq!(merged.host(), "cache");
        assert_eq!(merged.port(), 6390);
        assert_eq!(merged.password(), Some("new"));
        assert_eq!(merged.db(), Some(7));
        assert_eq!(merged.max_connections(), 30);
        assert_eq!(merged.socket_timeout(), Duration::from_secs(1));
        assert_eq!(merged.socket_connect_timeout(), Duration::from_secs(5));
        assert!(merged.ssl());
        assert_eq!(merged.ssl_cert_reqs(), Some(CertReqs::Optional));
    }

    #[test]
    fn test_merge_configs_sentinel_fields() {
        let base = sentinel_config(vec!["s0:26379".into()], Some("base"));
        let theirs = sentinel_config(
            vec!["sentinel1:26379".into(), "sentinel2:26379".into()],
            None,
        );
        let merged = merge_configs(&base, &theirs);
        assert_eq!(merged.mode(), Mode::Sentinel);
        assert_eq!(
            merged.sentinel_hosts().unwrap(),
            ["sentinel1:26379".to_string(), "sentinel2:26379".to_string()]
        );
        assert_eq!(merged.service_name(), Some("base"));
    }

    #[test]
    fn test_merge_configs_mode_switch() {
        let base = default_config(None);
        let theirs = ConnectionConfig::builder()
            .cluster(vec!["node1:7000".into(), "node2:7001".into()])
            .build()
            .unwrap();
        let merged = merge_configs(&base, &theirs);
        assert_eq!(merged.mode(), Mode::Cluster);
        assert_eq!(merged.cluster_nodes().unwrap().len(), 2);

        // A standalone override keeps the base topology.
        let merged = merge_configs(&theirs, &default_config(None));
        assert_eq!(merged.mode(), Mode::Cluster);
    }

    #[test]
    fn test_merge_standalone_onto_cluster_keeps_first_node_address() {
        let base = parse_redis_uri("redis+cluster://node1:7000,node2:7001").unwrap();
        let theirs = ConnectionConfig::builder()
            .host("elsewhere")
            .port(6390)
            .max_connections(40)
            .build()
            .unwrap();

        let merged = merge_configs(&base, &theirs);
        assert_eq!(merged.mode(), Mode::Cluster);
        assert_eq!(merged.host(), "node1");
        assert_eq!(merged.port(), 7000);
        assert_eq!(merged.addr(), merged.cluster_nodes().unwrap()[0]);
        assert_eq!(merged.max_connections(), 40);
    }

    #[test]
    fn test_validate_config() {
        assert!(validate_config(&default_config(None)).is_ok());

        let blank = ConnectionConfig::builder().host("  ").build().unwrap();
        assert_eq!(
            validate_config(&blank).unwrap_err().to_string(),
            "Host cannot be empty"
        );

        let no_service = sentinel_config(vec!["sentinel1:26379".into()], None);
        assert_eq!(
            validate_config(&no_service).unwrap_err().to_string(),
            "Service name is required for Sentinel mode"
        );

        let no_hosts = sentinel_config(Vec::new(), Some("mymaster"));
        assert_eq!(
            validate_config(&no_hosts).unwrap_err().to_string(),
            "Sentinel hosts are required for Sentinel mode"
        );

        let no_nodes = default_config(Some(Mode::Cluster));
        assert!(validate_config(&no_nodes)
            .unwrap_err()
            .to_string()
            .starts_with("Cluster nodes are required"));

        let tls = ConnectionConfig::builder().ssl(true).build().unwrap();
        assert_eq!(
            validate_config(&tls).unwrap_err().to_string(),
            "SSL certificate requirements must be specified when SSL is enabled"
        );
    }

    #[test]
    fn test_validate_is_idempotent() {
        let config = parse_redis_uri("rediss://localhost/1").unwrap();
        let before = config.clone();
        assert!(validate_config(&config).is_ok());
        assert!(validate_config(&config).is_ok());
        assert_eq!(config, before);
    }
}
