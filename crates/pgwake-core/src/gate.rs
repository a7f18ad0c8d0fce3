//! Sync gate — suppresses action until the initial event listing is done.
//!
//! The event source replays every existing event as a fresh notification
//! when a watch starts. Acting on those would re-fire every historical
//! scale signal on each restart, so the gate stays closed until every
//! watched scope has finished its initial listing. Arming is one-way.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::Notify;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct GateInner {
    armed: AtomicBool,
    notify: Notify,
}

/// Shared, cloneable handle over the process-wide armed flag.
#[derive(Debug, Clone, Default)]
pub struct SyncGate {
    inner: Arc<GateInner>,
}

impl SyncGate {
    /// A new, unarmed gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the gate. Idempotent; the gate never closes again.
    pub fn arm(&self) {
        if !self.inner.armed.swap(true, Ordering::AcqRel) {
            info!("sync gate armed");
            self.inner.notify.notify_waiters();
        }
    }

    /// Whether the gate has been armed.
    pub fn is_armed(&self) -> bool {
        self.inner.armed.load(Ordering::Acquire)
    }

    /// Resolve once the gate has been armed.
    pub async fn armed(&self) {
        loop {
            // Registered before the flag check so an arm() in between is
            // not missed.
            let notified = self.inner.notify.notified();
            if self.is_armed() {
                return;
            }
            notified.await;
        }
    }
}

/// Arms a gate once every watched scope reports its initial listing done.
#[derive(Debug, Clone)]
pub struct SyncBarrier {
    gate: SyncGate,
    pending: Arc<AtomicUsize>,
}

impl SyncBarrier {
    /// Barrier over `scopes` watched scopes. Zero scopes arms immediately.
    pub fn new(gate: SyncGate, scopes: usize) -> Self {
        if scopes == 0 {
            gate.arm();
        }
        Self {
            gate,
            pending: Arc::new(AtomicUsize::new(scopes)),
        }
    }

    /// Record that one scope finished its initial listing.
    ///
    /// Callers report each scope once; see [`ScopeSync`] for a guard that
    /// enforces that.
    pub fn scope_synced(&self) {
        let previous = self
            .pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        match previous {
            Ok(1) => self.gate.arm(),
            Ok(n) => debug!(remaining = n - 1, "scope synced"),
            Err(_) => {}
        }
    }

    /// Per-scope handle that reports to the barrier at most once.
    pub fn scope(&self) -> ScopeSync {
        ScopeSync {
            barrier: self.clone(),
            reported: false,
        }
    }

    /// Number of scopes still listing.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }
}

/// One scope's view of a [`SyncBarrier`].
#[derive(Debug)]
pub struct ScopeSync {
    barrier: SyncBarrier,
    reported: bool,
}

impl ScopeSync {
    /// Report this scope as synced. Later calls are no-ops.
    pub fn synced(&mut self) {
        if !self.reported {
            self.reported = true;
            self.barrier.scope_synced();
        }
    }

    /// Whether this scope has already reported.
    pub fn has_reported(&self) -> bool {
        self.reported
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn gate_starts_unarmed() {
        assert!(!SyncGate::new().is_armed());
    }

    #[test]
    fn arm_is_idempotent_and_shared() {
        let gate = SyncGate::new();
        let handle = gate.clone();
        gate.arm();
        gate.arm();
        assert!(gate.is_armed());
        assert!(handle.is_armed());
    }

    #[tokio::test]
    async fn armed_resolves_after_arm() {
        let gate = SyncGate::new();
        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.armed().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        gate.arm();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter did not wake")
            .unwrap();
    }

    #[tokio::test]
    async fn armed_returns_immediately_when_already_armed() {
        let gate = SyncGate::new();
        gate.arm();
        tokio::time::timeout(Duration::from_millis(100), gate.armed())
            .await
            .unwrap();
    }

    #[test]
    fn barrier_arms_after_last_scope() {
        let gate = SyncGate::new();
        let barrier = SyncBarrier::new(gate.clone(), 2);
        let mut a = barrier.scope();
        let mut b = barrier.scope();

        a.synced();
        assert!(!gate.is_armed());
        assert_eq!(barrier.pending(), 1);

        b.synced();
        assert!(gate.is_armed());
        assert_eq!(barrier.pending(), 0);
    }

    #[test]
    fn duplicate_scope_reports_do_not_arm_early() {
        let gate = SyncGate::new();
        let barrier = SyncBarrier::new(gate.clone(), 2);
        let mut a = barrier.scope();

        a.synced();
        a.synced();
        assert!(a.has_reported());
        assert!(!gate.is_armed());
    }

    #[test]
    fn extra_reports_do_not_underflow() {
        let gate = SyncGate::new();
        let barrier = SyncBarrier::new(gate.clone(), 1);
        barrier.scope_synced();
        barrier.scope_synced();
        assert!(gate.is_armed());
        assert_eq!(barrier.pending(), 0);
    }

    #[test]
    fn zero_scopes_arm_immediately() {
        let gate = SyncGate::new();
        let _barrier = SyncBarrier::new(gate.clone(), 0);
        assert!(gate.is_armed());
    }
}
