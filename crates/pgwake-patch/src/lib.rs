//! pgwake-patch — applies scale decisions to the cluster.
//!
//! Every decision becomes a JSON merge patch that touches only
//! `spec.replicas`:
//!
//! ```text
//! PATCH /apis/apps/v1/namespaces/{ns}/statefulsets/{name}
//! Content-Type: application/merge-patch+json
//!
//! {"spec":{"replicas":1}}
//! ```
//!
//! Other fields of the target are left alone, so concurrent edits by
//! operators survive, and re-applying the same decision converges to the
//! same state. Patch calls carry a timeout so a wedged API connection
//! cannot stall the watch loop.

pub mod error;
pub mod patcher;

pub use error::{PatchError, PatchResult};
pub use patcher::{FIELD_MANAGER, KubePatcher, Patcher, ReplicaPatch, ReplicaSpec};
