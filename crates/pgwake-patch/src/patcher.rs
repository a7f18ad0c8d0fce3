//! The `Patcher` seam and its cluster-backed implementation.

use std::future::Future;
use std::time::Duration;

use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use kube::Client;
use kube::api::{Api, Patch, PatchParams};
use serde::Serialize;
use tracing::debug;

use pgwake_core::{ResourceKind, ScaleDecision};

use crate::error::{PatchError, PatchResult};

/// Field manager recorded on every patch.
pub const FIELD_MANAGER: &str = "pgwake";

/// Applies a scale decision to its target resource.
///
/// Implementations must only touch the replica count so repeated
/// application is idempotent.
pub trait Patcher: Send + Sync {
    fn apply(&self, decision: &ScaleDecision) -> impl Future<Output = PatchResult<()>> + Send;
}

/// Merge-patch body: `{"spec":{"replicas":N}}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReplicaPatch {
    pub spec: ReplicaSpec,
}

/// The `spec` part of a [`ReplicaPatch`]; nothing but the replica count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReplicaSpec {
    pub replicas: i32,
}

impl ReplicaPatch {
    /// Body that sets the decision's desired replica count.
    pub fn for_decision(decision: &ScaleDecision) -> Self {
        Self {
            spec: ReplicaSpec {
                replicas: decision.desired_replicas.count(),
            },
        }
    }
}

/// Patcher backed by the cluster API.
#[derive(Clone)]
pub struct KubePatcher {
    client: Client,
    timeout: Duration,
}

impl KubePatcher {
    /// Create a patcher; each patch call is bounded by `timeout`.
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    async fn patch_replicas(&self, decision: &ScaleDecision) -> PatchResult<()> {
        let body = ReplicaPatch::for_decision(decision);
        let params = PatchParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        };
        let patch = Patch::Merge(&body);
        let ns = decision.target_namespace.as_str();
        let name = decision.target_resource_name.as_str();

        let result = match decision.kind {
            ResourceKind::StatefulSet => {
                let api: Api<StatefulSet> = Api::namespaced(self.client.clone(), ns);
                api.patch(name, &params, &patch).await.map(drop)
            }
            ResourceKind::Deployment => {
                let api: Api<Deployment> = Api::namespaced(self.client.clone(), ns);
                api.patch(name, &params, &patch).await.map(drop)
            }
        };

        result.map_err(|e| match e {
            kube::Error::Api(ref status) if status.code == 404 => PatchError::NotFound {
                kind: decision.kind.to_string(),
                namespace: ns.to_string(),
                name: name.to_string(),
            },
            other => PatchError::Api(other),
        })
    }
}

impl Patcher for KubePatcher {
    async fn apply(&self, decision: &ScaleDecision) -> PatchResult<()> {
        debug!(
            kind = %decision.kind,
            name = %decision.target_resource_name,
            namespace = %decision.target_namespace,
            replicas = decision.desired_replicas.count(),
            "patching replicas"
        );

        tokio::time::timeout(self.timeout, self.patch_replicas(decision))
            .await
            .map_err(|_| PatchError::Timeout(self.timeout))?
    }
}
