// node/src/main.rs

//! Ledger node binary.
//!
//! One process plays every role of the network:
//!
//! - block store and gossip peer (`/block`, `/blockchain`, `/list`,
//!   `/register`),
//! - onion relay (`/request`) that also mines exit payloads,
//! - client entry point (`/send`) and chat reader (`/chats`).
//!
//! It also advertises itself as a relay by mining a fresh `node` block at a
//! fixed interval, and exports Prometheus metrics on `/metrics`.

mod config;
mod routes;
mod state;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::signal;

use ledger::{
    HttpPeerTransport, MetricsRegistry, NodeRegistry, OnionRouter, SyncOrchestrator,
    load_or_generate, run_prometheus_http_server,
    sync::{forward_accepted, spawn_broadcaster, spawn_gossip},
};

use config::NodeConfig;
use state::{AppState, SharedState, attach_views};

#[tokio::main]
async fn main() {
    // Basic tracing setup.
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "node=info,ledger=info".to_string()),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let cfg = NodeConfig::from_env()?;

    // ---------------------------
    // Metrics
    // ---------------------------

    let metrics = Arc::new(
        MetricsRegistry::new()
            .map_err(|e| format!("failed to initialise metrics registry: {e}"))?,
    );

    if cfg.ledger.metrics.enabled {
        let metrics_clone = metrics.clone();
        let addr = cfg.ledger.metrics.listen_addr;
        tokio::spawn(async move {
            if let Err(e) = run_prometheus_http_server(metrics_clone, addr).await {
                tracing::error!("metrics HTTP server error: {e}");
            }
        });
    }

    // ---------------------------
    // Relay keypair
    // ---------------------------

    let key_file = cfg.key_file();
    let key_bits = cfg.key_bits;
    let keys = tokio::task::spawn_blocking(move || load_or_generate(&key_file, key_bits))
        .await
        .map_err(|e| format!("keypair task failed: {e}"))?
        .map_err(|e| format!("failed to load keypair {}: {e}", cfg.key_file().display()))?;

    // ---------------------------
    // Sync layer
    // ---------------------------

    let transport = Arc::new(
        HttpPeerTransport::new(cfg.ledger.sync.request_timeout)
            .map_err(|e| format!("failed to create peer transport: {e}"))?,
    );
    let sync = Arc::new(SyncOrchestrator::new(
        cfg.ledger.sync.clone(),
        cfg.ledger.consensus.clone(),
        cfg.local_peer(),
        transport.clone(),
        metrics.clone(),
    ));

    let nodes = Arc::new(Mutex::new(NodeRegistry::new()));
    let chats = Arc::new(Mutex::new(Vec::new()));
    attach_views(
        &sync,
        nodes.clone(),
        chats.clone(),
        cfg.ledger.registry.node_ttl_ms,
    );
    let accepted = forward_accepted(&sync);

    if let Some(master) = cfg.master_peer() {
        if !master.same_endpoint(&cfg.local_peer()) {
            sync.register_master(master.clone());
            if let Err(e) = sync.bootstrap_from(&master).await {
                tracing::warn!(master = %master.base_url(), error = %e, "bootstrap failed, relying on gossip");
            }
        }
    }

    spawn_broadcaster(sync.clone(), accepted);
    spawn_gossip(sync.clone());

    // ---------------------------
    // Shared state
    // ---------------------------

    let app_state: SharedState = Arc::new(AppState {
        sync: sync.clone(),
        router: OnionRouter::new(nodes.clone(), transport),
        keys,
        nodes,
        chats,
        metrics,
        advertise_host: cfg.advertise_host.clone(),
        port: cfg.port,
    });

    // ---------------------------
    // Relay heartbeat
    // ---------------------------

    let heartbeat_state = app_state.clone();
    let heartbeat = cfg.heartbeat_interval;
    tokio::spawn(async move {
        run_relay_heartbeat(heartbeat_state, heartbeat).await;
    });

    // ---------------------------
    // axum 0.8 server
    // ---------------------------

    let app = routes::router(app_state);

    tracing::info!(
        "node listening on http://{} (advertised as {})",
        cfg.listen_addr,
        cfg.local_peer().base_url()
    );

    let listener = tokio::net::TcpListener::bind(cfg.listen_addr)
        .await
        .map_err(|e| format!("failed to bind {}: {e}", cfg.listen_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("HTTP server error: {e}"))?;

    Ok(())
}

/// Background relay advertisement loop.
///
/// Mines a freshly signed `node` block every `interval`, starting
/// immediately, so that peers keep this node in their relay directories.
async fn run_relay_heartbeat(state: SharedState, interval: Duration) {
    tracing::info!(
        "relay heartbeat running with interval {}s",
        interval.as_secs()
    );
    let mut ticker = tokio::time::interval(interval);

    loop {
        ticker.tick().await;

        let payload = match state.relay_advertisement() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("failed to sign relay advertisement: {e}");
                continue;
            }
        };
        match state.mine_and_submit(payload).await {
            Ok(outcome) => tracing::debug!(?outcome, "relay advertisement submitted"),
            Err(e) => tracing::warn!("relay advertisement rejected: {e}"),
        }
    }
}

/// Waits for Ctrl-C and returns, used for graceful shutdown.
async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
