//! Metrics and instrumentation for the ledger.
//!
//! This module defines Prometheus-compatible metrics for block acceptance,
//! recovery, gossip and mining, and exposes a small HTTP exporter that
//! serves `/metrics` in Prometheus text format.
//!
//! Typical usage in a node:
//!
//! ```ignore
//! use std::net::SocketAddr;
//! use std::sync::Arc;
//! use ledger::metrics::{MetricsRegistry, run_prometheus_http_server};
//!
//! let registry = Arc::new(MetricsRegistry::new()?);
//! let addr: SocketAddr = "127.0.0.1:9898".parse()?;
//!
//! tokio::spawn(run_prometheus_http_server(registry.clone(), addr));
//!
//! registry.ledger.mining_seconds.observe(duration_secs);
//! ```

pub mod prometheus;

pub use self::prometheus::{LedgerMetrics, MetricsRegistry, run_prometheus_http_server};
