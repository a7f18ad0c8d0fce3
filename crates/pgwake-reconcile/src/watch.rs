//! Watch drivers — one task per watched scope.

use std::fmt;
use std::sync::Arc;

use futures::{Stream, StreamExt, TryStreamExt};
use k8s_openapi::api::core::v1::Event;
use kube::runtime::{WatchStreamExt, watcher};
use kube::{Api, Client};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use pgwake_core::{ClusterEvent, ConfigError, ConfigResult, ScopeSync, SyncBarrier};
use pgwake_patch::Patcher;

use crate::reconciler::{Outcome, Reconciler};

/// Where events are watched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchScope {
    Namespace(String),
    AllNamespaces,
}

impl WatchScope {
    /// Resolve the configured scopes.
    ///
    /// Exactly one of a non-empty namespace list or the cluster-wide flag
    /// must be given. Blank and duplicate namespaces are dropped.
    pub fn from_config(namespaces: &[String], all_namespaces: bool) -> ConfigResult<Vec<Self>> {
        let mut scopes: Vec<WatchScope> = Vec::new();
        for ns in namespaces.iter().map(|ns| ns.trim()).filter(|ns| !ns.is_empty()) {
            let scope = WatchScope::Namespace(ns.to_string());
            if !scopes.contains(&scope) {
                scopes.push(scope);
            }
        }

        match (scopes.is_empty(), all_namespaces) {
            (true, true) => Ok(vec![WatchScope::AllNamespaces]),
            (false, false) => Ok(scopes),
            (false, true) => Err(ConfigError::InvalidScope(
                "namespaces and all-namespaces are mutually exclusive".to_string(),
            )),
            (true, false) => Err(ConfigError::InvalidScope(
                "TARGET_NAMESPACES env var is required (or set WATCH_ALL_NAMESPACES=true)".to_string(),
            )),
        }
    }

    fn api(&self, client: Client) -> Api<Event> {
        match self {
            WatchScope::Namespace(ns) => Api::namespaced(client, ns),
            WatchScope::AllNamespaces => Api::all(client),
        }
    }
}

impl fmt::Display for WatchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchScope::Namespace(ns) => f.write_str(ns),
            WatchScope::AllNamespaces => f.write_str("*"),
        }
    }
}

/// A notification from the event source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A (re-)listing started.
    ListStarted,
    /// An existing event delivered as part of a listing.
    Listed(ClusterEvent),
    /// The listing finished.
    ListDone,
    /// An event was added or updated.
    Applied(ClusterEvent),
    /// An event was deleted.
    Deleted,
}

impl From<watcher::Event<Event>> for Notification {
    fn from(event: watcher::Event<Event>) -> Self {
        match event {
            watcher::Event::Init => Notification::ListStarted,
            watcher::Event::InitApply(ev) => Notification::Listed(ClusterEvent::from(&ev)),
            watcher::Event::InitDone => Notification::ListDone,
            watcher::Event::Apply(ev) => Notification::Applied(ClusterEvent::from(&ev)),
            watcher::Event::Delete(_) => Notification::Deleted,
        }
    }
}

/// Counters for one scope's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScopeSummary {
    pub gated: usize,
    pub ignored: usize,
    pub patched: usize,
    pub failed: usize,
    pub stream_errors: usize,
}

impl ScopeSummary {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Gated => self.gated += 1,
            Outcome::Ignored => self.ignored += 1,
            Outcome::Applied { succeeded, failed } => {
                self.patched += succeeded;
                self.failed += failed;
            }
        }
    }
}

/// Consume one scope's notification stream until it ends or shutdown.
///
/// The first `ListDone` is reported to the sync barrier. Stream errors are
/// logged and skipped; the watcher re-lists on its own.
pub async fn drive_scope<S, E, P>(
    scope: &WatchScope,
    stream: S,
    reconciler: Arc<Reconciler<P>>,
    mut sync: ScopeSync,
    mut shutdown: watch::Receiver<bool>,
) -> ScopeSummary
where
    S: Stream<Item = Result<Notification, E>>,
    E: fmt::Display,
    P: Patcher,
{
    let mut summary = ScopeSummary::default();
    let mut stream = std::pin::pin!(stream);

    debug!(%scope, "watch loop starting");

    loop {
        tokio::select! {
            next = stream.next() => {
                let notification = match next {
                    Some(Ok(n)) => n,
                    Some(Err(e)) => {
                        summary.stream_errors += 1;
                        warn!(%scope, error = %e, "event watch error");
                        continue;
                    }
                    None => {
                        warn!(%scope, "event watch ended");
                        break;
                    }
                };

                match notification {
                    Notification::ListStarted => debug!(%scope, "listing events"),
                    Notification::ListDone => {
                        if !sync.has_reported() {
                            info!(%scope, "initial event listing complete");
                        }
                        sync.synced();
                    }
                    Notification::Listed(event) | Notification::Applied(event) => {
                        summary.record(reconciler.handle(&event).await);
                    }
                    Notification::Deleted => {}
                }
            }
            _ = shutdown.changed() => {
                debug!(%scope, "watch loop shutting down");
                break;
            }
        }
    }

    summary
}

/// Spawn a watch task per scope against the cluster API.
pub fn spawn_watchers<P>(
    client: &Client,
    scopes: &[WatchScope],
    reconciler: Arc<Reconciler<P>>,
    barrier: &SyncBarrier,
    shutdown: &watch::Receiver<bool>,
) -> Vec<JoinHandle<ScopeSummary>>
where
    P: Patcher + 'static,
{
    scopes
        .iter()
        .cloned()
        .map(|scope| {
            let stream = watcher(scope.api(client.clone()), watcher::Config::default())
                .default_backoff()
                .map_ok(Notification::from);
            let reconciler = Arc::clone(&reconciler);
            let sync = barrier.scope();
            let shutdown = shutdown.clone();

            info!(%scope, "starting event watch");
            tokio::spawn(async move { drive_scope(&scope, stream, reconciler, sync, shutdown).await })
        })
        .collect()
}
