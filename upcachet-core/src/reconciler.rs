//! Decides what must be pushed to the status page for a monitor snapshot.

use std::sync::Arc;

use tracing::{debug, info};

use upcachet_types::{Actions, Bindings, ComponentAction, MetricAction, Monitor};

use crate::state::StateStore;

/// Compares fresh monitor snapshots against the [`StateStore`] and emits the
/// component and metric actions the change calls for.
///
/// State is committed as soon as a decision is made, before anything is
/// published. A failed publish is therefore not retried until the monitor
/// changes again, which keeps a flaky status page from being hammered with
/// the same update every poll.
#[derive(Debug)]
pub struct Reconciler {
    bindings: Arc<Bindings>,
    state: StateStore,
}

impl Reconciler {
    /// Create a reconciler with an empty state store.
    pub fn new(bindings: impl Into<Arc<Bindings>>) -> Self {
        Self::with_state(bindings, StateStore::new())
    }

    /// Create a reconciler starting from an existing state store.
    pub fn with_state(bindings: impl Into<Arc<Bindings>>, state: StateStore) -> Self {
        Self {
            bindings: bindings.into(),
            state,
        }
    }

    /// Decide the actions for a single monitor and update the state store.
    pub fn reconcile(&mut self, monitor: &Monitor) -> Actions {
        let mut actions = Actions::new();
        self.reconcile_status(monitor, &mut actions);
        self.reconcile_metric(monitor, &mut actions);
        actions
    }

    /// Reconcile every monitor of a fetch, concatenating the actions in order.
    pub fn reconcile_all(&mut self, monitors: &[Monitor]) -> Actions {
        monitors.iter().map(|m| self.reconcile(m)).collect()
    }

    /// The bindings this reconciler applies.
    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// The current state store.
    pub fn state(&self) -> &StateStore {
        &self.state
    }

    fn reconcile_status(&mut self, monitor: &Monitor, actions: &mut Actions) {
        let previous = self.state.status(monitor.id);
        if previous == Some(monitor.status) {
            return;
        }

        match previous {
            Some(prev) => info!(
                monitor = monitor.id,
                name = %monitor.name,
                "status changed from {} to {}",
                prev,
                monitor.status
            ),
            None => debug!(
                monitor = monitor.id,
                name = %monitor.name,
                status = %monitor.status,
                "first status seen"
            ),
        }

        let components = self.bindings.components_for(monitor.id);
        if !components.is_empty() {
            match self.bindings.translate(monitor.status) {
                Some(status) => actions
                    .components
                    .extend(components.iter().map(|&component| ComponentAction {
                        monitor: monitor.id,
                        component,
                        status,
                    })),
                None => debug!(
                    monitor = monitor.id,
                    status = %monitor.status,
                    "no component status configured for this monitor status"
                ),
            }
        }

        self.state.set_status(monitor.id, monitor.status);
    }

    fn reconcile_metric(&mut self, monitor: &Monitor, actions: &mut Actions) {
        let metrics = self.bindings.metrics_for(monitor.id);
        if metrics.is_empty() {
            return;
        }

        let Some(sample) = monitor.latest_sample() else {
            return;
        };

        if sample.timestamp <= self.state.last_metric_time(monitor.id) {
            return;
        }

        actions
            .metrics
            .extend(metrics.iter().map(|&metric| MetricAction {
                monitor: monitor.id,
                metric,
                value: sample.value,
                timestamp: sample.timestamp,
            }));

        self.state.set_last_metric_time(monitor.id, sample.timestamp);
    }
}
