//! The slice of a cluster event the agent cares about.

use k8s_openapi::api::core::v1::Event;

/// A domain event as delivered by the event source.
///
/// Only the four fields the classifier reads are kept. Absent fields on
/// the wire become empty strings, which the classifier treats as
/// irrelevant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterEvent {
    /// Component that emitted the event, e.g. `keda-operator`.
    pub source_component: String,
    /// Machine-readable reason, e.g. `KEDAScaleTargetActivated`.
    pub reason: String,
    /// Name of the object the event is about.
    pub involved_object_name: String,
    /// Namespace of the object the event is about.
    pub involved_object_namespace: String,
}

impl ClusterEvent {
    /// Build an event from its four fields.
    pub fn new(
        source_component: impl Into<String>,
        reason: impl Into<String>,
        name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            source_component: source_component.into(),
            reason: reason.into(),
            involved_object_name: name.into(),
            involved_object_namespace: namespace.into(),
        }
    }
}

impl From<&Event> for ClusterEvent {
    fn from(event: &Event) -> Self {
        // Events written through the newer recorder leave `source` empty and
        // fill `reportingComponent` instead.
        let source_component = event
            .source
            .as_ref()
            .and_then(|s| s.component.clone())
            .filter(|c| !c.is_empty())
            .or_else(|| event.reporting_component.clone())
            .unwrap_or_default();

        Self {
            source_component,
            reason: event.reason.clone().unwrap_or_default(),
            involved_object_name: event.involved_object.name.clone().unwrap_or_default(),
            involved_object_namespace: event
                .involved_object
                .namespace
                .clone()
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{EventSource, ObjectReference};

    fn raw_event(component: Option<&str>, reporting: Option<&str>) -> Event {
        Event {
            reason: Some("KEDAScaleTargetActivated".to_string()),
            source: component.map(|c| EventSource {
                component: Some(c.to_string()),
                host: None,
            }),
            reporting_component: reporting.map(str::to_string),
            involved_object: ObjectReference {
                name: Some("shop-core".to_string()),
                namespace: Some("ns1".to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn converts_legacy_source_component() {
        let event = ClusterEvent::from(&raw_event(Some("keda-operator"), None));
        assert_eq!(
            event,
            ClusterEvent::new("keda-operator", "KEDAScaleTargetActivated", "shop-core", "ns1")
        );
    }

    #[test]
    fn falls_back_to_reporting_component() {
        let event = ClusterEvent::from(&raw_event(Some(""), Some("keda-operator")));
        assert_eq!(event.source_component, "keda-operator");
    }

    #[test]
    fn missing_fields_become_empty() {
        let event = ClusterEvent::from(&Event::default());
        assert_eq!(event, ClusterEvent::default());
    }
}
