//! pgwaked — the pgwake daemon.
//!
//! Watches cluster events for KEDA scale-target activation signals and
//! patches the replica count of each application's database workload:
//!
//! - Event watch, one task per namespace (or cluster-wide)
//! - Sync gate, armed once every watch has finished its initial listing
//! - Classifier + merge-patch reconciler
//! - `/health` and `/ready` endpoints
//!
//! # Usage
//!
//! ```text
//! TARGET_NAMESPACES=shop,billing pgwaked
//! pgwaked --all-namespaces --targets 'statefulset:{base}-postgresql,deployment:{base}-minio'
//! ```

mod cli;
mod client;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info, warn};

use pgwake_core::{Classifier, SyncBarrier, SyncGate};
use pgwake_patch::KubePatcher;
use pgwake_reconcile::{Reconciler, WatchScope, spawn_watchers};

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match cli::parse_failure(&e) {
            Some(line) => {
                eprintln!("{line}");
                std::process::exit(1);
            }
            None => e.exit(),
        },
    };
    init_tracing(cli.log_json);

    if let Err(e) = run(cli).await {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,pgwaked=debug,pgwake=debug"));

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // ── Configuration ──────────────────────────────────────────

    let scopes = cli.scopes()?;
    let classifier = Classifier::new(cli.classifier_config())?;
    let client = client::resolve_client(cli.kubeconfig.as_deref()).await?;

    let targets: Vec<String> = classifier.config().targets.iter().map(ToString::to_string).collect();
    info!(
        scopes = %format_scopes(&scopes),
        targets = ?targets,
        source = %classifier.config().source_component,
        "pgwake starting"
    );

    // ── Reconciler ─────────────────────────────────────────────

    let gate = SyncGate::new();
    let barrier = SyncBarrier::new(gate.clone(), scopes.len());
    let patcher = KubePatcher::new(client.clone(), cli.patch_timeout());
    let reconciler = Arc::new(Reconciler::new(gate.clone(), classifier, patcher));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Health endpoint ────────────────────────────────────────

    let health_addr = SocketAddr::from(([0, 0, 0, 0], cli.health_port));
    let health_gate = gate.clone();
    let health_shutdown = shutdown_rx.clone();
    let health_handle = tokio::spawn(async move {
        if let Err(e) = pgwake_health::serve(health_addr, health_gate, health_shutdown).await {
            error!(error = %e, "health endpoint failed");
        }
    });

    // ── Event watches ──────────────────────────────────────────

    let watch_handles = spawn_watchers(&client, &scopes, reconciler, &barrier, &shutdown_rx);

    let sync_timeout = cli.sync_timeout();
    tokio::select! {
        synced = tokio::time::timeout(sync_timeout, gate.armed()) => {
            if synced.is_err() {
                let _ = shutdown_tx.send(true);
                bail!(
                    "failed to sync event watch for namespaces {} within {:?} ({} of {} still listing)",
                    format_scopes(&scopes),
                    sync_timeout,
                    barrier.pending(),
                    scopes.len(),
                );
            }
            info!(scopes = %format_scopes(&scopes), "informers synced, watching for new events");
        }
        _ = shutdown_signal() => {
            info!("shutdown signal received before sync");
            let _ = shutdown_tx.send(true);
            return join(health_handle, watch_handles).await;
        }
    }

    shutdown_signal().await;
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);

    join(health_handle, watch_handles).await
}

async fn join(
    health: tokio::task::JoinHandle<()>,
    watches: Vec<tokio::task::JoinHandle<pgwake_reconcile::ScopeSummary>>,
) -> anyhow::Result<()> {
    for handle in watches {
        let summary = handle.await.context("watch task panicked")?;
        info!(
            gated = summary.gated,
            ignored = summary.ignored,
            patched = summary.patched,
            failed = summary.failed,
            stream_errors = summary.stream_errors,
            "watch stopped"
        );
    }
    let _ = health.await;

    info!("pgwake stopped");
    Ok(())
}

fn format_scopes(scopes: &[WatchScope]) -> String {
    scopes.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
}

/// Resolve on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
