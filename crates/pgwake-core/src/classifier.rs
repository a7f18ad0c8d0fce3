//! Event classifier — maps a cluster event to zero or more scale decisions.
//!
//! # Rules
//!
//! ```text
//! source component != trusted producer      → drop
//! name/namespace empty                      → drop
//! allow-list non-empty and name not in it   → drop
//! reason == activated                       → Up   (1 replica)
//! reason == deactivated                     → Down (0 replicas)
//! anything else                             → drop
//!
//! base   = name with strip suffix removed (if present)
//! target = template.render(base), one per configured template
//! ```

use crate::decision::{Replicas, ScaleDecision, TargetTemplate};
use crate::error::{ConfigError, ConfigResult};
use crate::event::ClusterEvent;

/// Tunables for the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierConfig {
    /// The only source component whose events are trusted.
    pub source_component: String,
    /// Reason that scales targets up.
    pub activated_reason: String,
    /// Reason that scales targets down.
    pub deactivated_reason: String,
    /// Suffix removed from the involved object's name to get the base name.
    pub strip_suffix: String,
    /// Application names to react to. Empty means every application.
    pub watched_apps: Vec<String>,
    /// Dependent resources to scale, in patch order. The first is primary.
    pub targets: Vec<TargetTemplate>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            source_component: "keda-operator".to_string(),
            activated_reason: "KEDAScaleTargetActivated".to_string(),
            deactivated_reason: "KEDAScaleTargetDeactivated".to_string(),
            strip_suffix: "-core".to_string(),
            watched_apps: Vec::new(),
            targets: vec![TargetTemplate::default()],
        }
    }
}

/// Pure event classifier.
#[derive(Debug, Clone)]
pub struct Classifier {
    config: ClassifierConfig,
}

impl Classifier {
    /// Build a classifier, rejecting configs with no scale targets.
    pub fn new(config: ClassifierConfig) -> ConfigResult<Self> {
        if config.targets.is_empty() {
            return Err(ConfigError::NoTargets);
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Decision for the primary target, if the event is a scale signal.
    pub fn classify(&self, event: &ClusterEvent) -> Option<ScaleDecision> {
        self.decisions(event).into_iter().next()
    }

    /// One decision per configured target, in template order.
    ///
    /// Empty when the event is not a trusted scale signal for a watched
    /// application.
    pub fn decisions(&self, event: &ClusterEvent) -> Vec<ScaleDecision> {
        let Some((base, replicas)) = self.signal(event) else {
            return Vec::new();
        };

        self.config
            .targets
            .iter()
            .map(|template| ScaleDecision {
                kind: template.kind,
                target_resource_name: template.render(base),
                target_namespace: event.involved_object_namespace.clone(),
                desired_replicas: replicas,
            })
            .collect()
    }

    /// The base name and replica count carried by a scale signal.
    fn signal<'a>(&self, event: &'a ClusterEvent) -> Option<(&'a str, Replicas)> {
        if event.source_component != self.config.source_component {
            return None;
        }

        let name = event.involved_object_name.as_str();
        if name.is_empty() || event.involved_object_namespace.is_empty() {
            return None;
        }

        let replicas = if event.reason == self.config.activated_reason {
            Replicas::Up
        } else if event.reason == self.config.deactivated_reason {
            Replicas::Down
        } else {
            return None;
        };

        let base = name.strip_suffix(self.config.strip_suffix.as_str()).unwrap_or(name);
        if base.is_empty() {
            return None;
        }

        if !self.is_watched(name, base) {
            return None;
        }

        Some((base, replicas))
    }

    fn is_watched(&self, name: &str, base: &str) -> bool {
        let apps = &self.config.watched_apps;
        apps.is_empty() || apps.iter().any(|app| app == name || app == base)
    }
}
