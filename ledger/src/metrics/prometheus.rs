//! Prometheus-backed metrics and HTTP exporter.
//!
//! This module defines a [`MetricsRegistry`] that owns a Prometheus
//! registry and a set of strongly-typed ledger metrics, and an async HTTP
//! exporter that serves `/metrics` using `hyper`.

use std::{convert::Infallible, net::SocketAddr, sync::Arc};

use bytes::Bytes;
use http_body_util::Full;
use hyper::{
    Method, Request, Response, StatusCode, body::Incoming, header, server::conn::http1,
    service::service_fn,
};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use prometheus::{
    self, Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry, TextEncoder,
};

/// Ledger Prometheus metrics.
///
/// Updated from the sync layer (acceptance, recovery, gossip) and from the
/// node binary (mining).
#[derive(Clone)]
pub struct LedgerMetrics {
    /// Blocks verified and added to the tree, from any source.
    pub blocks_accepted: IntCounter,
    /// Blocks refused by the verifier with a non-recoverable error.
    pub blocks_rejected: IntCounter,
    /// Recovery passes started because of a missing ancestor.
    pub recoveries: IntCounter,
    /// Blocks currently held back while a recovery runs.
    pub hold_back_queue: IntGauge,
    /// Per-peer gossip exchanges that failed or timed out.
    pub gossip_failures: IntCounter,
    /// Wall-clock time spent searching for a proof-of-work nonce.
    pub mining_seconds: Histogram,
}

impl LedgerMetrics {
    /// Registers ledger metrics into the given `Registry`.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let blocks_accepted = IntCounter::with_opts(Opts::new(
            "blocks_accepted_total",
            "Total number of blocks added to the local tree",
        ))?;
        registry.register(Box::new(blocks_accepted.clone()))?;

        let blocks_rejected = IntCounter::with_opts(Opts::new(
            "blocks_rejected_total",
            "Total number of blocks rejected by the verifier",
        ))?;
        registry.register(Box::new(blocks_rejected.clone()))?;

        let recoveries = IntCounter::with_opts(Opts::new(
            "recoveries_total",
            "Total number of missing-ancestor recoveries started",
        ))?;
        registry.register(Box::new(recoveries.clone()))?;

        let hold_back_queue = IntGauge::with_opts(Opts::new(
            "hold_back_queue_len",
            "Blocks queued while a recovery is in progress",
        ))?;
        registry.register(Box::new(hold_back_queue.clone()))?;

        let gossip_failures = IntCounter::with_opts(Opts::new(
            "gossip_failures_total",
            "Total number of failed per-peer gossip exchanges",
        ))?;
        registry.register(Box::new(gossip_failures.clone()))?;

        // Mining at a three-zero prefix is usually well under a second, but
        // a busy host can stretch it.
        let mining_seconds = Histogram::with_opts(
            HistogramOpts::new("mining_seconds", "Time to find a proof-of-work nonce")
                .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        )?;
        registry.register(Box::new(mining_seconds.clone()))?;

        Ok(Self {
            blocks_accepted,
            blocks_rejected,
            recoveries,
            hold_back_queue,
            gossip_failures,
            mining_seconds,
        })
    }
}

/// Wrapper around a Prometheus registry and the ledger metrics.
///
/// This is the main handle you pass around in the node. It can be wrapped
/// in an [`Arc`] and shared across threads/tasks.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,
    pub ledger: LedgerMetrics,
}

impl MetricsRegistry {
    /// Creates a new `MetricsRegistry` with a fresh underlying `Registry`
    /// and registers the ledger metrics.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("ledger".to_string()), None)?;
        let ledger = LedgerMetrics::register(&registry)?;
        Ok(Self { registry, ledger })
    }

    /// Encodes all metrics in this registry into the Prometheus text format.
    pub fn gather_text(&self) -> String {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!(error = %e, "failed to encode Prometheus metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// Runs an HTTP server that exposes Prometheus metrics.
///
/// The server listens on `addr` and serves `GET /metrics` with the
/// Prometheus text exposition format. All other paths return 404.
pub async fn run_prometheus_http_server(
    metrics: Arc<MetricsRegistry>,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "metrics exporter listening");

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let svc = service_fn(move |req| {
                let metrics = metrics.clone();
                handle_request(req, metrics)
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, svc).await {
                tracing::warn!(error = %err, "metrics connection error");
            }
        });
    }
}

async fn handle_request(
    req: Request<Incoming>,
    metrics: Arc<MetricsRegistry>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let (status, content_type, body) = match (req.method(), req.uri().path()) {
        (&Method::GET, "/metrics") => (
            StatusCode::OK,
            "text/plain; version=0.0.4",
            metrics.gather_text(),
        ),
        _ => (
            StatusCode::NOT_FOUND,
            "text/plain",
            "not found".to_string(),
        ),
    };

    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, header::HeaderValue::from_static(content_type));
    Ok(response)
}
