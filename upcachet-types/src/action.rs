//! Actions decided by the reconciler and executed by the publisher.

use crate::{ComponentId, ComponentStatus, MetricId, MonitorId};

/// Set a component to a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComponentAction {
    /// Monitor whose status change produced this action.
    pub monitor: MonitorId,
    pub component: ComponentId,
    pub status: ComponentStatus,
}

/// Append a point to a metric series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricAction {
    /// Monitor whose sample produced this action.
    pub monitor: MonitorId,
    pub metric: MetricId,
    pub value: u32,

    /// Unix timestamp (seconds) of the sample.
    pub timestamp: u64,
}

/// Everything one reconciliation decided to push downstream.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Actions {
    pub components: Vec<ComponentAction>,
    pub metrics: Vec<MetricAction>,
}

impl Actions {
    /// Create an empty action set.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when nothing needs to be published.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty() && self.metrics.is_empty()
    }

    /// Total number of remote calls these actions require.
    pub fn len(&self) -> usize {
        self.components.len() + self.metrics.len()
    }

    /// Move all actions from `other` into `self`, keeping order.
    pub fn append(&mut self, other: &mut Actions) {
        self.components.append(&mut other.components);
        self.metrics.append(&mut other.metrics);
    }
}

impl Extend<Actions> for Actions {
    fn extend<T: IntoIterator<Item = Actions>>(&mut self, iter: T) {
        for mut actions in iter {
            self.append(&mut actions);
        }
    }
}

impl FromIterator<Actions> for Actions {
    fn from_iter<I: IntoIterator<Item = Actions>>(iter: I) -> Self {
        let mut all = Actions::new();
        all.extend(iter);
        all
    }
}
