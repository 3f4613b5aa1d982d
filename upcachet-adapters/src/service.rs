//! Collaborator interfaces consumed by the reconciliation core.

use async_trait::async_trait;

use upcachet_types::{AccountDetails, Component, ComponentId, ComponentStatus, MetricId, Monitor};

use crate::AdapterError;

/// A service that health-checks endpoints and records response times.
#[async_trait]
pub trait MonitoringService: Send + Sync {
    /// Account metadata, including how often monitors are checked.
    async fn get_account_details(&self) -> Result<AccountDetails, AdapterError>;

    /// All monitors on the account, with recent response times newest first.
    async fn get_monitors(&self) -> Result<Vec<Monitor>, AdapterError>;
}

/// A status page that displays components and metric series.
#[async_trait]
pub trait StatusPageService: Send + Sync {
    /// Set the displayed status of a component.
    async fn update_component_status(
        &self,
        component: ComponentId,
        status: ComponentStatus,
    ) -> Result<(), AdapterError>;

    /// Append a point to a metric series at the given Unix timestamp (seconds).
    async fn append_metric_point(
        &self,
        metric: MetricId,
        value: u32,
        timestamp: u64,
    ) -> Result<(), AdapterError>;

    /// Every component on the status page.
    async fn list_components(&self) -> Result<Vec<Component>, AdapterError>;
}
