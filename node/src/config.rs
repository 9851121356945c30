//! Node configuration.
//!
//! Defaults describe a single node on localhost. Every field a deployment
//! needs to change is overridable through the environment:
//!
//! | variable          | meaning                                   | default     |
//! |-------------------|-------------------------------------------|-------------|
//! | `PORT`            | HTTP port (listen and advertised)         | `8001`      |
//! | `ADVERTISE_HOST`  | host peers and clients should dial        | `127.0.0.1` |
//! | `MASTER_HOST`     | bootstrap peer host                       | unset       |
//! | `MASTER_PORT`     | bootstrap peer port                       | `8001`      |
//! | `DATA_DIR`        | directory of the keypair file             | `data`      |
//! | `KEY_BITS`        | RSA size for a freshly generated keypair  | `2048`      |
//! | `HEARTBEAT_SECS`  | relay advertisement interval              | `30`        |
//! | `METRICS_ADDR`    | Prometheus exporter address               | `127.0.0.1:9898` |
//! | `STRICT_IDENTITY` | reject chats from unregistered keys (`1`) | off         |

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use ledger::{LedgerConfig, Peer};

/// Configuration for a node process.
#[derive(Clone, Debug)]
pub struct NodeConfig {
    /// Address to bind the HTTP server to.
    pub listen_addr: SocketAddr,
    /// Host this node advertises to peers and in its relay blocks.
    pub advertise_host: String,
    /// Port this node advertises.
    pub port: u16,
    /// Bootstrap peer `(host, port)`, if any.
    pub master: Option<(String, u16)>,
    /// Directory holding `onion<port>.json`.
    pub data_dir: PathBuf,
    /// RSA key size used when no keypair file exists yet.
    pub key_bits: usize,
    /// Interval between relay advertisements.
    pub heartbeat_interval: Duration,
    pub ledger: LedgerConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        let port = 8001;
        Self {
            // All interfaces, so container port mappings reach the node.
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)),
            advertise_host: "127.0.0.1".to_string(),
            port,
            master: None,
            data_dir: PathBuf::from("data"),
            key_bits: 2048,
            heartbeat_interval: Duration::from_secs(30),
            ledger: LedgerConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(port) = parse_var::<u16>(&lookup, "PORT")? {
            cfg.port = port;
            cfg.listen_addr.set_port(port);
        }
        if let Some(host) = lookup("ADVERTISE_HOST") {
            cfg.advertise_host = host;
        }
        if let Some(host) = lookup("MASTER_HOST") {
            let port = parse_var::<u16>(&lookup, "MASTER_PORT")?.unwrap_or(8001);
            cfg.master = Some((host, port));
        }
        if let Some(dir) = lookup("DATA_DIR") {
            cfg.data_dir = PathBuf::from(dir);
        }
        if let Some(bits) = parse_var::<usize>(&lookup, "KEY_BITS")? {
            cfg.key_bits = bits;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "HEARTBEAT_SECS")? {
            cfg.heartbeat_interval = Duration::from_secs(secs.max(1));
        }
        if let Some(addr) = parse_var::<SocketAddr>(&lookup, "METRICS_ADDR")? {
            cfg.ledger.metrics.listen_addr = addr;
        }
        if let Some(flag) = lookup("STRICT_IDENTITY") {
            cfg.ledger.consensus.require_registered_identity = matches!(flag.as_str(), "1" | "true");
        }

        Ok(cfg)
    }

    /// How this node announces itself on `POST /register`.
    pub fn local_peer(&self) -> Peer {
        Peer::new(
            self.advertise_host.clone(),
            self.port,
            self.ledger.sync.advertised_ttl_ms,
        )
    }

    /// The bootstrap peer, flagged so it never expires.
    pub fn master_peer(&self) -> Option<Peer> {
        self.master.as_ref().map(|(host, port)| Peer {
            is_master: true,
            ..Peer::new(host.clone(), *port, self.ledger.sync.advertised_ttl_ms)
        })
    }

    pub fn key_file(&self) -> PathBuf {
        self.data_dir.join(format!("onion{}.json", self.port))
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| format!("invalid {key}={raw:?}: {e}"))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let cfg = NodeConfig::from_lookup(|_| None).unwrap();
        assert_eq!(cfg.port, 8001);
        assert!(cfg.master_peer().is_none());
        assert_eq!(cfg.key_file(), PathBuf::from("data").join("onion8001.json"));
    }

    #[test]
    fn environment_overrides_defaults() {
        let cfg = NodeConfig::from_lookup(lookup(&[
            ("PORT", "8003"),
            ("ADVERTISE_HOST", "node3"),
            ("MASTER_HOST", "node1"),
            ("DATA_DIR", "/var/lib/ledger"),
            ("STRICT_IDENTITY", "1"),
        ]))
        .unwrap();

        assert_eq!(cfg.listen_addr.port(), 8003);
        assert_eq!(cfg.local_peer().base_url(), "http://node3:8003");
        let master = cfg.master_peer().unwrap();
        assert!(master.is_master);
        assert_eq!(master.base_url(), "http://node1:8001");
        assert_eq!(cfg.key_file(), PathBuf::from("/var/lib/ledger/onion8003.json"));
        assert!(cfg.ledger.consensus.require_registered_identity);
    }

    #[test]
    fn malformed_values_are_reported() {
        let err = NodeConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.contains("PORT"));
    }
}
