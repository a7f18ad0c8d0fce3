//! pgwake-reconcile — the event-driven reconciliation loop.
//!
//! One task per watched scope pulls notifications from the cluster's
//! event watch and pushes each through the shared [`Reconciler`]:
//!
//! ```text
//! watcher(Api<Event>) ──► Notification ──► drive_scope
//!                                            │
//!        ListDone ──► SyncBarrier ──► SyncGate (arm once, all scopes)
//!                                            │
//!        Listed / Applied ──► Reconciler::handle
//!                               ├── gate closed  → Gated
//!                               ├── no decision  → Ignored
//!                               └── Patcher::apply per decision
//! ```
//!
//! # States
//!
//! The loop is `SYNCING` until the gate arms and `ARMED` forever after.
//! Watch reconnects re-list inside the watcher; those re-listings are not
//! re-gated.

pub mod reconciler;
pub mod watch;

pub use reconciler::{Outcome, Reconciler};
pub use watch::{Notification, ScopeSummary, WatchScope, drive_scope, spawn_watchers};
