//! In-process doubles of the remote services for unit tests.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use upcachet_adapters::{AdapterError, MonitoringService, StatusPageService};
use upcachet_types::{AccountDetails, Component, ComponentId, ComponentStatus, MetricId, Monitor};

#[derive(Debug, Default)]
pub struct MockMonitoring {
    account: AccountDetails,
    monitors: Mutex<Vec<Monitor>>,
    fetches: AtomicUsize,
    fail_fetch: AtomicBool,
    fail_account: AtomicBool,
    fetch_delay: Mutex<Option<Duration>>,
}

impl MockMonitoring {
    /// Monitors checked every `minutes`, the way the account reports it.
    pub fn with_interval(minutes: u64) -> Self {
        Self {
            account: AccountDetails {
                email: "ops@example.com".to_string(),
                monitor_limit: 50,
                monitor_interval: Duration::from_secs(minutes * 60),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn set_monitors(&self, monitors: Vec<Monitor>) {
        *self.monitors.lock() = monitors;
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_fetch.store(failing, Ordering::SeqCst);
    }

    pub fn fail_account(&self) {
        self.fail_account.store(true, Ordering::SeqCst);
    }

    /// Make every later fetch take `delay` before answering.
    pub fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.lock() = Some(delay);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MonitoringService for MockMonitoring {
    async fn get_account_details(&self) -> Result<AccountDetails, AdapterError> {
        if self.fail_account.load(Ordering::SeqCst) {
            return Err(AdapterError::Auth("api_key is invalid.".to_string()));
        }
        Ok(self.account.clone())
    }

    async fn get_monitors(&self) -> Result<Vec<Monitor>, AdapterError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let delay = *self.fetch_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(AdapterError::Connection("connection refused".to_string()));
        }
        Ok(self.monitors.lock().clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Component(ComponentId, u8),
    Metric(MetricId, u32, u64),
}

#[derive(Debug, Default)]
pub struct MockStatusPage {
    components: Vec<Component>,
    calls: Mutex<Vec<Call>>,
    applied: Mutex<Vec<Call>>,
    failing_components: Mutex<BTreeSet<ComponentId>>,
    failing_metrics: Mutex<BTreeSet<MetricId>>,
}

impl MockStatusPage {
    pub fn with_components(components: Vec<Component>) -> Self {
        Self {
            components,
            ..Default::default()
        }
    }

    pub fn fail_component(&self, id: ComponentId) {
        self.failing_components.lock().insert(id);
    }

    pub fn fail_metric(&self, id: MetricId) {
        self.failing_metrics.lock().insert(id);
    }

    /// Every call attempted, including failed ones.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Only the calls that succeeded.
    pub fn applied(&self) -> Vec<Call> {
        self.applied.lock().clone()
    }

    fn record(&self, call: Call, fail: bool) -> Result<(), AdapterError> {
        self.calls.lock().push(call);
        if fail {
            return Err(AdapterError::Http("500 Internal Server Error".to_string()));
        }
        self.applied.lock().push(call);
        Ok(())
    }
}

#[async_trait]
impl StatusPageService for MockStatusPage {
    async fn update_component_status(
        &self,
        component: ComponentId,
        status: ComponentStatus,
    ) -> Result<(), AdapterError> {
        let fail = self.failing_components.lock().contains(&component);
        self.record(Call::Component(component, status.code()), fail)
    }

    async fn append_metric_point(
        &self,
        metric: MetricId,
        value: u32,
        timestamp: u64,
    ) -> Result<(), AdapterError> {
        let fail = self.failing_metrics.lock().contains(&metric);
        self.record(Call::Metric(metric, value, timestamp), fail)
    }

    async fn list_components(&self) -> Result<Vec<Component>, AdapterError> {
        Ok(self.components.clone())
    }
}
