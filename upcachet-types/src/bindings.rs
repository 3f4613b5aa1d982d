//! Static configuration linking monitors to status-page entities.

use std::collections::BTreeMap;

use crate::{ComponentId, ComponentStatus, MetricId, MonitorId, MonitorStatus};

/// Monitor-to-status-page bindings.
///
/// Read-only once the loop runs. A monitor missing from a map, or a status
/// missing from the translation table, simply produces no action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bindings {
    /// Components mirroring each monitor's status.
    pub components: BTreeMap<MonitorId, Vec<ComponentId>>,

    /// Metrics fed by each monitor's response times.
    pub metrics: BTreeMap<MonitorId, Vec<MetricId>>,

    /// Monitor status to component status translation.
    pub statuses: BTreeMap<MonitorStatus, ComponentStatus>,
}

impl Default for Bindings {
    fn default() -> Self {
        Self {
            components: BTreeMap::new(),
            metrics: BTreeMap::new(),
            statuses: default_translation(),
        }
    }
}

impl Bindings {
    /// Bindings with no translation entries at all.
    pub fn empty() -> Self {
        Self {
            components: BTreeMap::new(),
            metrics: BTreeMap::new(),
            statuses: BTreeMap::new(),
        }
    }

    /// Bind a monitor to components.
    pub fn component(
        mut self,
        monitor: MonitorId,
        components: impl IntoIterator<Item = ComponentId>,
    ) -> Self {
        self.components
            .entry(monitor)
            .or_default()
            .extend(components);
        self
    }

    /// Bind a monitor to metrics.
    pub fn metric(mut self, monitor: MonitorId, metrics: impl IntoIterator<Item = MetricId>) -> Self {
        self.metrics.entry(monitor).or_default().extend(metrics);
        self
    }

    /// Add or replace a status translation.
    pub fn status(mut self, from: MonitorStatus, to: ComponentStatus) -> Self {
        self.statuses.insert(from, to);
        self
    }

    /// Components bound to a monitor, in configuration order.
    pub fn components_for(&self, monitor: MonitorId) -> &[ComponentId] {
        self.components.get(&monitor).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Metrics bound to a monitor, in configuration order.
    pub fn metrics_for(&self, monitor: MonitorId) -> &[MetricId] {
        self.metrics.get(&monitor).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Translate a monitor status, if a translation is configured.
    pub fn translate(&self, status: MonitorStatus) -> Option<ComponentStatus> {
        self.statuses.get(&status).copied()
    }

    /// True when no monitor is bound to any component.
    ///
    /// This is the first-run condition: the bridge has nothing to mirror yet.
    pub fn has_no_components(&self) -> bool {
        self.components.is_empty()
    }
}

/// Down maps to a major outage, Up to operational.
pub fn default_translation() -> BTreeMap<MonitorStatus, ComponentStatus> {
    BTreeMap::from([
        (MonitorStatus::Down, ComponentStatus::MAJOR_OUTAGE),
        (MonitorStatus::Up, ComponentStatus::OPERATIONAL),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_translation() {
        let bindings = Bindings::default();
        assert_eq!(
            bindings.translate(MonitorStatus::Down),
            Some(ComponentStatus::MAJOR_OUTAGE)
        );
        assert_eq!(
            bindings.translate(MonitorStatus::Up),
            Some(ComponentStatus::OPERATIONAL)
        );
        assert_eq!(bindings.translate(MonitorStatus::Paused), None);
    }

    #[test]
    fn test_unbound_monitor_has_empty_slices() {
        let bindings = Bindings::default().component(1, [10]);
        assert!(bindings.components_for(2).is_empty());
        assert!(bindings.metrics_for(1).is_empty());
    }

    #[test]
    fn test_component_order_preserved() {
        let bindings = Bindings::default().component(1, [11, 10]).component(1, [12]);
        assert_eq!(bindings.components_for(1), &[11, 10, 12]);
    }

    #[test]
    fn test_has_no_components() {
        assert!(Bindings::default().has_no_components());
        assert!(Bindings::default().metric(1, [99]).has_no_components());
        assert!(!Bindings::default().component(1, [10]).has_no_components());
    }

    #[test]
    fn test_empty_has_no_translation() {
        let bindings = Bindings::empty().status(MonitorStatus::SeemsDown, ComponentStatus(3));
        assert_eq!(bindings.translate(MonitorStatus::Down), None);
        assert_eq!(
            bindings.translate(MonitorStatus::SeemsDown),
            Some(ComponentStatus::PARTIAL_OUTAGE)
        );
    }
}
