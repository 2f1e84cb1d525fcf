//! Field mapping from `ConnectionConfig` onto `redis` connection parameters.

use std::fs;

use redis::{ConnectionAddr, ConnectionInfo, RedisConnectionInfo, TlsCertificates, TlsMode};

use rf_common::{parse_host_port, validate_config, ConfigError, ConnectionConfig, Mode, TlsSettings};

use crate::client::{FactoryError, FactoryResult};

/// Mode-match guard plus full validation, run by every builder.
pub(crate) fn ensure_mode(config: &ConnectionConfig, expected: Mode) -> FactoryResult<()> {
    let actual = config.mode();
    if actual != expected {
        return Err(ConfigError::ModeMismatch { expected, actual }.into());
    }
    validate_config(config)?;
    Ok(())
}

/// Connection parameters for one node.
pub(crate) fn node_info(
    host: &str,
    port: u16,
    password: Option<&str>,
    db: u32,
    tls: &TlsSettings,
) -> ConnectionInfo {
    let addr = if tls.enabled {
        ConnectionAddr::TcpTls {
            host: host.to_string(),
            port,
            insecure: !verifies(tls),
            tls_params: None,
        }
    } else {
        ConnectionAddr::Tcp(host.to_string(), port)
    };

    ConnectionInfo {
        addr,
        redis: RedisConnectionInfo {
            db: i64::from(db),
            password: password.map(str::to_string),
            ..Default::default()
        },
    }
}

/// Splits `host:port` entries, keeping their order.
pub(crate) fn split_nodes(entries: &[String], default_port: u16) -> FactoryResult<Vec<(String, u16)>> {
    entries
        .iter()
        .map(|entry| parse_host_port(entry, default_port).map_err(FactoryError::from))
        .collect()
}

/// TLS mode handed to the library when TLS is on.
pub(crate) fn tls_mode(tls: &TlsSettings) -> Option<TlsMode> {
    tls.enabled.then(|| {
        if verifies(tls) {
            TlsMode::Secure
        } else {
            TlsMode::Insecure
        }
    })
}

/// Loads the PEM bundle named by `ssl_ca_certs`, if TLS is on and one is set.
pub(crate) fn root_certificates(tls: &TlsSettings) -> FactoryResult<Option<TlsCertificates>> {
    let path = match (&tls.ca_certs, tls.enabled) {
        (Some(path), true) => path,
        _ => return Ok(None),
    };
    let root_cert = fs::read(path).map_err(|source| FactoryError::CaCerts {
        path: path.clone(),
        source,
    })?;
    Ok(Some(TlsCertificates {
        client_tls: None,
        root_cert: Some(root_cert),
    }))
}

// Validation guarantees cert_reqs is set whenever TLS is on.
fn verifies(tls: &TlsSettings) -> bool {
    tls.cert_reqs.map_or(true, |reqs| reqs.verifies())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use rf_common::CertReqs;

    use super::*;

    fn tls(cert_reqs: Option<CertReqs>) -> TlsSettings {
        TlsSettings {
            enabled: true,
            cert_reqs,
            ca_certs: None,
        }
    }

    #[test]
    fn test_node_info_plain() {
        let info = node_info("cache", 6380, Some("pw"), 3, &TlsSettings::default());
        assert!(matches!(info.addr, ConnectionAddr::Tcp(ref host, 6380) if host == "cache"));
        assert_eq!(info.redis.db, 3);
        assert_eq!(info.redis.password.as_deref(), Some("pw"));
        assert_eq!(info.redis.username, None);
    }

    #[test]
    fn test_node_info_tls_follows_cert_reqs() {
        let info = node_info("cache", 6380, None, 0, &tls(Some(CertReqs::Required)));
        assert!(matches!(info.addr, ConnectionAddr::TcpTls { insecure: false, .. }));

        let info = node_info("cache", 6380, None, 0, &tls(Some(CertReqs::None)));
        assert!(matches!(info.addr, ConnectionAddr::TcpTls { insecure: true, .. }));
    }

    #[test]
    fn test_tls_mode() {
        assert!(tls_mode(&TlsSettings::default()).is_none());
        assert!(matches!(tls_mode(&tls(Some(CertReqs::Required))), Some(TlsMode::Secure)));
        assert!(matches!(tls_mode(&tls(Some(CertReqs::Optional))), Some(TlsMode::Insecure)));
    }

    #[test]
    fn test_split_nodes_keeps_order() {
        let nodes = split_nodes(&["b:2".into(), "a".into()], 7000).unwrap();
        assert_eq!(nodes, vec![("b".to_string(), 2), ("a".to_string(), 7000)]);
        assert!(matches!(
            split_nodes(&["a:0".into()], 7000),
            Err(FactoryError::Config(ConfigError::InvalidPort))
        ));
    }

    #[test]
    fn test_root_certificates_missing_file() {
        let mut settings = tls(Some(CertReqs::Required));
        assert!(root_certificates(&settings).unwrap().is_none());

        settings.ca_certs = Some(PathBuf::from("/nonexistent/ca.pem"));
        let err = root_certificates(&settings).err().expect("expected an error");
        assert!(matches!(err, FactoryError::CaCerts { .. }));
        assert!(err.to_string().contains("/nonexistent/ca.pem"));
    }
}
