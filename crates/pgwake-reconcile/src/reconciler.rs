//! Reconciler — gate, classify, patch.

use tracing::{error, info, trace};

use pgwake_core::{Classifier, ClusterEvent, SyncGate};
use pgwake_patch::Patcher;

/// What happened to a single notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Dropped because the sync gate is not armed yet.
    Gated,
    /// Not a scale signal for a watched application.
    Ignored,
    /// Patches were issued for every configured target.
    Applied { succeeded: usize, failed: usize },
}

/// Turns notifications into replica patches.
///
/// Shared between scope tasks behind an `Arc`; the only state read on the
/// hot path is the gate's atomic flag.
pub struct Reconciler<P> {
    gate: SyncGate,
    classifier: Classifier,
    patcher: P,
}

impl<P: Patcher> Reconciler<P> {
    pub fn new(gate: SyncGate, classifier: Classifier, patcher: P) -> Self {
        Self {
            gate,
            classifier,
            patcher,
        }
    }

    /// The gate this reconciler checks before acting.
    pub fn gate(&self) -> &SyncGate {
        &self.gate
    }

    /// The patcher decisions are applied through.
    pub fn patcher(&self) -> &P {
        &self.patcher
    }

    /// Process one notification.
    ///
    /// Every notification kind is gated the same way. Patch failures are
    /// logged and counted but never retried; the producer re-emits the
    /// signal on its next evaluation cycle.
    pub async fn handle(&self, event: &ClusterEvent) -> Outcome {
        if !self.gate.is_armed() {
            trace!(name = %event.involved_object_name, reason = %event.reason, "gate closed, dropping event");
            return Outcome::Gated;
        }

        let decisions = self.classifier.decisions(event);
        if decisions.is_empty() {
            return Outcome::Ignored;
        }

        info!(
            app = %event.involved_object_name,
            namespace = %event.involved_object_namespace,
            reason = %event.reason,
            targets = decisions.len(),
            "scale signal received"
        );

        let mut succeeded = 0;
        let mut failed = 0;

        for decision in &decisions {
            match self.patcher.apply(decision).await {
                Ok(()) => {
                    succeeded += 1;
                    info!(
                        kind = %decision.kind,
                        name = %decision.target_resource_name,
                        namespace = %decision.target_namespace,
                        replicas = decision.desired_replicas.count(),
                        "scaled"
                    );
                }
                Err(e) => {
                    failed += 1;
                    error!(
                        kind = %decision.kind,
                        name = %decision.target_resource_name,
                        namespace = %decision.target_namespace,
                        replicas = decision.desired_replicas.count(),
                        error = %e,
                        "failed to scale"
                    );
                }
            }
        }

        Outcome::Applied { succeeded, failed }
    }
}
