//! Last-known state per monitor.

use std::collections::BTreeMap;

use upcachet_types::{MonitorId, MonitorStatus};

/// In-memory record of what the reconciler has already seen and forwarded.
///
/// Lives for the lifetime of the process and is owned by the reconciler, so
/// all access happens on the scheduler task. Absent keys are not errors:
/// [`status`](Self::status) returns `None` and
/// [`last_metric_time`](Self::last_metric_time) returns `0`.
#[derive(Debug, Default, Clone)]
pub struct StateStore {
    statuses: BTreeMap<MonitorId, MonitorStatus>,
    metric_times: BTreeMap<MonitorId, u64>,
}

impl StateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last recorded status of a monitor, if any.
    pub fn status(&self, monitor: MonitorId) -> Option<MonitorStatus> {
        self.statuses.get(&monitor).copied()
    }

    /// Record the status of a monitor.
    pub fn set_status(&mut self, monitor: MonitorId, status: MonitorStatus) {
        self.statuses.insert(monitor, status);
    }

    /// Timestamp of the last metric point forwarded for a monitor, or `0`.
    pub fn last_metric_time(&self, monitor: MonitorId) -> u64 {
        self.metric_times.get(&monitor).copied().unwrap_or(0)
    }

    /// Record the timestamp of a forwarded metric point.
    ///
    /// The recorded value never moves backwards: an older timestamp is ignored.
    pub fn set_last_metric_time(&mut self, monitor: MonitorId, timestamp: u64) {
        let recorded = self.metric_times.entry(monitor).or_insert(0);
        if timestamp > *recorded {
            *recorded = timestamp;
        }
    }

    /// Number of monitors with a recorded status.
    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    /// True when no status has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }
}
