//! Scale decisions and the templates that name their targets.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

const BASE_PLACEHOLDER: &str = "{base}";

/// The two replica counts the agent ever asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Replicas {
    /// Scaled to zero.
    Down,
    /// A single replica.
    Up,
}

impl Replicas {
    /// The replica count as sent in `spec.replicas`.
    pub fn count(self) -> i32 {
        match self {
            Replicas::Down => 0,
            Replicas::Up => 1,
        }
    }
}

impl fmt::Display for Replicas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.count())
    }
}

/// Workload class of a scale target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    StatefulSet,
    Deployment,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::StatefulSet => f.write_str("statefulset"),
            ResourceKind::Deployment => f.write_str("deployment"),
        }
    }
}

impl FromStr for ResourceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "statefulset" | "sts" => Ok(ResourceKind::StatefulSet),
            "deployment" | "deploy" => Ok(ResourceKind::Deployment),
            _ => Err(ConfigError::UnknownKind(s.to_string())),
        }
    }
}

/// A single desired-replica change, derived from one event.
///
/// Decisions are never stored or compared across events; repeated
/// decisions are harmless because the patch that applies them only sets
/// the replica count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleDecision {
    /// Workload class of the target.
    pub kind: ResourceKind,
    /// Rendered from a target template and the application's base name.
    pub target_resource_name: String,
    /// Namespace of the event's involved object.
    pub target_namespace: String,
    /// Replica count to set.
    pub desired_replicas: Replicas,
}

/// Names a dependent resource relative to an application's base name.
///
/// Written as `<kind>:<pattern>`, e.g. `statefulset:{base}-postgresql` or
/// `deployment:{base}-minio`. The kind prefix is optional and defaults to
/// `statefulset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetTemplate {
    pub kind: ResourceKind,
    pattern: String,
}

impl TargetTemplate {
    pub fn new(kind: ResourceKind, pattern: impl Into<String>) -> Result<Self, ConfigError> {
        let pattern = pattern.into();
        if !pattern.contains(BASE_PLACEHOLDER) {
            return Err(ConfigError::MissingPlaceholder(pattern));
        }
        Ok(Self { kind, pattern })
    }

    /// Apply the template to an application base name.
    pub fn render(&self, base: &str) -> String {
        self.pattern.replace(BASE_PLACEHOLDER, base)
    }
}

impl Default for TargetTemplate {
    fn default() -> Self {
        Self {
            kind: ResourceKind::StatefulSet,
            pattern: "{base}-postgresql".to_string(),
        }
    }
}

impl FromStr for TargetTemplate {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once(':') {
            Some((kind, pattern)) => TargetTemplate::new(kind.parse()?, pattern.trim()),
            None => TargetTemplate::new(ResourceKind::StatefulSet, s),
        }
    }
}

impl fmt::Display for TargetTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.pattern)
    }
}
