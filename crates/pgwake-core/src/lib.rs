//! pgwake-core — the pure half of the pgwake reconciliation core.
//!
//! Holds the data model shared by every other crate, the event
//! classifier that turns a raw cluster event into scale decisions, and
//! the sync gate that keeps the agent silent while the initial event
//! listing is being replayed.
//!
//! # Flow
//!
//! ```text
//! v1/Event ──► ClusterEvent ──► SyncGate (drop until armed)
//!                                   │
//!                                   ▼
//!                              Classifier ──► Vec<ScaleDecision>
//! ```
//!
//! Nothing in this crate performs I/O. Patching lives in `pgwake-patch`
//! and the watch loop in `pgwake-reconcile`.

pub mod classifier;
pub mod decision;
pub mod error;
pub mod event;
pub mod gate;

pub use classifier::{Classifier, ClassifierConfig};
pub use decision::{Replicas, ResourceKind, ScaleDecision, TargetTemplate};
pub use error::{ConfigError, ConfigResult};
pub use event::ClusterEvent;
pub use gate::{ScopeSync, SyncBarrier, SyncGate};
