//! Applies decided actions to the status page.

use std::sync::Arc;

use tracing::{info, warn};

use upcachet_adapters::StatusPageService;
use upcachet_types::Actions;

/// Outcome of publishing one batch of actions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Component status updates accepted by the status page.
    pub component_updates: usize,
    /// Metric points accepted by the status page.
    pub metric_points: usize,
    /// Calls that failed. Each failure has been logged.
    pub failures: usize,
}

/// Executes actions against a [`StatusPageService`], best effort.
///
/// Every action is attempted independently: a failing call is logged and the
/// batch continues. Nothing is rolled back in the state store.
#[derive(Clone)]
pub struct Publisher {
    status_page: Arc<dyn StatusPageService>,
}

impl Publisher {
    pub fn new(status_page: Arc<dyn StatusPageService>) -> Self {
        Self { status_page }
    }

    /// Publish all actions, components first, in order.
    pub async fn publish(&self, actions: &Actions) -> PublishReport {
        let mut report = PublishReport::default();

        for action in &actions.components {
            info!(
                component = action.component,
                monitor = action.monitor,
                "updating component to status {}",
                action.status
            );
            match self
                .status_page
                .update_component_status(action.component, action.status)
                .await
            {
                Ok(()) => report.component_updates += 1,
                Err(e) => {
                    warn!(component = action.component, error = %e, "component update failed");
                    report.failures += 1;
                }
            }
        }

        for action in &actions.metrics {
            info!(
                metric = action.metric,
                monitor = action.monitor,
                timestamp = action.timestamp,
                "updating metric to value {}",
                action.value
            );
            match self
                .status_page
                .append_metric_point(action.metric, action.value, action.timestamp)
                .await
            {
                Ok(()) => report.metric_points += 1,
                Err(e) => {
                    warn!(metric = action.metric, error = %e, "metric update failed");
                    report.failures += 1;
                }
            }
        }

        report
    }
}

impl std::fmt::Debug for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher").finish_non_exhaustive()
    }
}
