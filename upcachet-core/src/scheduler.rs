//! The poll loop: fetch, reconcile, publish, on a fixed cadence.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use upcachet_adapters::{AdapterError, MonitoringService, StatusPageService};
use upcachet_types::{AccountDetails, Bindings};

use crate::error::SchedulerError;
use crate::handle::{Control, ControlHandle, SchedulerHandle};
use crate::publisher::{PublishReport, Publisher};
use crate::reconciler::Reconciler;
use crate::state::StateStore;

/// Poll interval used when the account's own interval is too short to halve.
pub const FALLBACK_INTERVAL: Duration = Duration::from_secs(60);

/// Lifecycle of the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Built or spawned but not yet polling.
    #[default]
    Starting,
    Running,
    Paused,
    /// Terminal.
    Stopped,
}

/// Result of one fetch-reconcile-publish pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Monitors returned by the fetch.
    pub monitors: usize,
    pub published: PublishReport,
}

/// Bookkeeping shared between the loop and its handle.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStatus {
    pub mode: Mode,
    /// Interval in effect, once known.
    pub interval: Option<Duration>,
    /// Passes that fetched monitors successfully.
    pub passes: u64,
    /// Passes abandoned because the fetch failed.
    pub failed_fetches: u64,
    pub last_pass: Option<PassReport>,
}

/// Half of the monitoring service's own check interval, in whole seconds.
///
/// Polling faster than monitors are checked only repeats the same answer.
/// Falls back to [`FALLBACK_INTERVAL`] when halving leaves nothing.
pub fn derive_interval(monitor_interval: Duration) -> Duration {
    match monitor_interval.as_secs() / 2 {
        0 => FALLBACK_INTERVAL,
        secs => Duration::from_secs(secs),
    }
}

pub(crate) fn log_account_usage(account: &AccountDetails) {
    info!(
        "monitoring account using {} monitors out of {}",
        account.monitors_in_use(),
        account.monitor_limit
    );
}

/// Drives the reconciliation core.
///
/// One pass runs at startup, then one per tick while running. Control
/// signals are read only between passes, so a pause never interrupts a batch
/// that is being published.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// use upcachet_adapters::{MonitoringService, StatusPageService};
/// use upcachet_core::Scheduler;
/// use upcachet_types::{AccountDetails, Bindings};
///
/// async fn run(
///     monitoring: Arc<dyn MonitoringService>,
///     status_page: Arc<dyn StatusPageService>,
/// ) {
///     let handle = Scheduler::builder(monitoring, status_page)
///         .bindings(Bindings::default().component(123, [456, 789]))
///         .interval(Duration::from_secs(90))
///         .build()
///         .start();
///
///     handle.pause();
///     handle.resume();
///     handle.stop();
///     handle.join().await.unwrap();
/// }
/// ```
pub struct Scheduler {
    monitoring: Arc<dyn MonitoringService>,
    publisher: Publisher,
    reconciler: Reconciler,
    interval: Option<Duration>,
    status: Arc<RwLock<SchedulerStatus>>,
}

impl Scheduler {
    /// Create a builder for a scheduler polling `monitoring` and publishing to
    /// `status_page`.
    pub fn builder(
        monitoring: Arc<dyn MonitoringService>,
        status_page: Arc<dyn StatusPageService>,
    ) -> SchedulerBuilder {
        SchedulerBuilder {
            monitoring,
            status_page,
            bindings: Bindings::default(),
            interval: None,
            state: None,
        }
    }

    /// The reconciler and its state store.
    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Current bookkeeping.
    pub fn status(&self) -> SchedulerStatus {
        self.status.read().clone()
    }

    /// Run one full pass over all monitors.
    ///
    /// A failed fetch returns the error and leaves the state store untouched.
    /// Publish failures are counted in the report, not returned.
    pub async fn refresh(&mut self) -> Result<PassReport, AdapterError> {
        let monitors = self.monitoring.get_monitors().await?;
        let actions = self.reconciler.reconcile_all(&monitors);
        let published = self.publisher.publish(&actions).await;

        Ok(PassReport {
            monitors: monitors.len(),
            published,
        })
    }

    /// Decide the poll interval.
    ///
    /// Account details are always fetched, both to log usage and because a
    /// failure here means the credentials are unusable.
    pub async fn poll_interval(&self) -> Result<Duration, SchedulerError> {
        let account = self
            .monitoring
            .get_account_details()
            .await
            .map_err(SchedulerError::AccountDetails)?;

        log_account_usage(&account);
        info!(
            "monitor interval is {} minutes",
            account.monitor_interval.as_secs() / 60
        );

        Ok(match self.interval {
            Some(interval) => interval,
            None => derive_interval(account.monitor_interval),
        })
    }

    /// Run the loop until a stop signal arrives or every sender is dropped.
    pub async fn run(mut self, mut control: mpsc::Receiver<Control>) -> Result<(), SchedulerError> {
        let period = match self.poll_interval().await {
            Ok(period) => period,
            Err(e) => {
                self.set_mode(Mode::Stopped);
                return Err(e);
            }
        };
        info!("check interval is {} seconds", period.as_secs_f64());
        self.status.write().interval = Some(period);

        self.set_mode(Mode::Running);
        self.pass().await;

        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut paused = false;

        loop {
            // Signals queued during a pass are handled before a tick that
            // came due in the meantime.
            tokio::select! {
                biased;

                signal = control.recv() => match signal {
                    Some(Control::Pause) => {
                        if !paused {
                            info!("monitoring paused");
                            paused = true;
                            self.set_mode(Mode::Paused);
                        }
                    }
                    Some(Control::Resume) => {
                        if paused {
                            info!("monitoring resumed");
                            paused = false;
                            self.set_mode(Mode::Running);
                            self.pass().await;
                        } else {
                            debug!("resume while running ignored");
                        }
                    }
                    Some(Control::Stop) | None => {
                        info!("monitoring stopped");
                        break;
                    }
                },
                _ = ticker.tick() => {
                    if paused {
                        debug!("paused, skipping poll");
                    } else {
                        self.pass().await;
                    }
                }
            }
        }

        self.set_mode(Mode::Stopped);
        Ok(())
    }

    /// Spawn the loop on the current tokio runtime.
    pub fn start(self) -> SchedulerHandle {
        let (control, rx) = ControlHandle::channel();
        let status = self.status.clone();
        let task = tokio::spawn(self.run(rx));

        SchedulerHandle {
            control,
            status,
            task,
        }
    }

    async fn pass(&mut self) {
        match self.refresh().await {
            Ok(report) => {
                debug!(
                    monitors = report.monitors,
                    component_updates = report.published.component_updates,
                    metric_points = report.published.metric_points,
                    failures = report.published.failures,
                    "pass complete"
                );
                let mut status = self.status.write();
                status.passes += 1;
                status.last_pass = Some(report);
            }
            Err(e) => {
                warn!(error = %e, "refresh failed, retrying on next poll");
                self.status.write().failed_fetches += 1;
            }
        }
    }

    fn set_mode(&self, mode: Mode) {
        self.status.write().mode = mode;
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("interval", &self.interval)
            .field("reconciler", &self.reconciler)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Scheduler`].
pub struct SchedulerBuilder {
    monitoring: Arc<dyn MonitoringService>,
    status_page: Arc<dyn StatusPageService>,
    bindings: Bindings,
    interval: Option<Duration>,
    state: Option<StateStore>,
}

impl SchedulerBuilder {
    /// Set the monitor bindings (default: no bindings, default translation).
    pub fn bindings(mut self, bindings: Bindings) -> Self {
        self.bindings = bindings;
        self
    }

    /// Poll at a fixed interval instead of deriving one from the account.
    ///
    /// A zero interval counts as not configured.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval).filter(|i| !i.is_zero());
        self
    }

    /// Start from a pre-populated state store.
    pub fn state(mut self, state: StateStore) -> Self {
        self.state = Some(state);
        self
    }

    /// Build the scheduler.
    pub fn build(self) -> Scheduler {
        let state = self.state.unwrap_or_default();

        Scheduler {
            monitoring: self.monitoring,
            publisher: Publisher::new(self.status_page),
            reconciler: Reconciler::with_state(self.bindings, state),
            interval: self.interval,
            status: Arc::new(RwLock::new(SchedulerStatus::default())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, MockMonitoring, MockStatusPage};
    use tokio::time::sleep;
    use upcachet_types::{Monitor, MonitorStatus};

    fn setup(
        minutes: u64,
        bindings: Bindings,
    ) -> (Arc<MockMonitoring>, Arc<MockStatusPage>, SchedulerBuilder) {
        let monitoring = Arc::new(MockMonitoring::with_interval(minutes));
        let page = Arc::new(MockStatusPage::default());
        let builder = Scheduler::builder(monitoring.clone(), page.clone()).bindings(bindings);
        (monitoring, page, builder)
    }

    #[test]
    fn test_derive_interval_halves_account_interval() {
        assert_eq!(derive_interval(Duration::from_secs(300)), Duration::from_secs(150));
        assert_eq!(derive_interval(Duration::from_secs(60)), Duration::from_secs(30));
        assert_eq!(derive_interval(Duration::from_secs(61)), Duration::from_secs(30));
    }

    #[test]
    fn test_derive_interval_fallback() {
        assert_eq!(derive_interval(Duration::ZERO), FALLBACK_INTERVAL);
        assert_eq!(derive_interval(Duration::from_secs(1)), FALLBACK_INTERVAL);
    }

    #[test]
    fn test_zero_interval_counts_as_unset() {
        let (_, _, builder) = setup(5, Bindings::default());
        let scheduler = builder.interval(Duration::ZERO).build();
        assert_eq!(scheduler.interval, None);
    }

    #[tokio::test]
    async fn test_poll_interval_derived_or_configured() {
        let (_, _, builder) = setup(5, Bindings::default());
        let scheduler = builder.build();
        assert_eq!(scheduler.poll_interval().await.unwrap(), Duration::from_secs(150));

        let (_, _, builder) = setup(5, Bindings::default());
        let scheduler = builder.interval(Duration::from_secs(20)).build();
        assert_eq!(scheduler.poll_interval().await.unwrap(), Duration::from_secs(20));
    }

    #[tokio::test]
    async fn test_refresh_publishes_then_settles() {
        let (monitoring, page, builder) = setup(5, Bindings::default().component(1, [10]));
        monitoring.set_monitors(vec![Monitor::new(1, "api", MonitorStatus::Down)]);
        let mut scheduler = builder.build();

        let report = scheduler.refresh().await.unwrap();
        assert_eq!(report.monitors, 1);
        assert_eq!(report.published.component_updates, 1);

        let report = scheduler.refresh().await.unwrap();
        assert_eq!(report.published, PublishReport::default());
        assert_eq!(page.calls(), vec![Call::Component(10, 4)]);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_state_untouched() {
        let (monitoring, page, builder) = setup(5, Bindings::default().component(1, [10]));
        monitoring.set_monitors(vec![Monitor::new(1, "api", MonitorStatus::Down)]);
        monitoring.set_failing(true);
        let mut scheduler = builder.build();

        assert!(scheduler.refresh().await.is_err());
        assert!(scheduler.reconciler().state().is_empty());
        assert!(page.calls().is_empty());

        monitoring.set_failing(false);
        let report = scheduler.refresh().await.unwrap();
        assert_eq!(report.published.component_updates, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_pass_then_cadence() {
        let (monitoring, _, builder) = setup(5, Bindings::default());
        let handle = builder.interval(Duration::from_secs(60)).build().start();

        sleep(Duration::from_secs(1)).await;
        assert_eq!(monitoring.fetch_count(), 1);
        assert_eq!(handle.mode(), Mode::Running);
        assert_eq!(handle.status().interval, Some(Duration::from_secs(60)));

        sleep(Duration::from_secs(124)).await;
        assert_eq!(monitoring.fetch_count(), 3);
        assert_eq!(handle.status().passes, 3);

        handle.stop();
        handle.join().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_derived_interval_used_when_unset() {
        let (monitoring, _, builder) = setup(5, Bindings::default());
        let handle = builder.build().start();

        sleep(Duration::from_secs(1)).await;
        assert_eq!(handle.status().interval, Some(Duration::from_secs(150)));

        sleep(Duration::from_secs(148)).await;
        assert_eq!(monitoring.fetch_count(), 1);

        sleep(Duration::from_secs(2)).await;
        assert_eq!(monitoring.fetch_count(), 2);

        handle.stop();
        handle.join().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_then_resume_runs_one_immediate_pass() {
        let (monitoring, _, builder) = setup(5, Bindings::default());
        let handle = builder.interval(Duration::from_secs(60)).build().start();

        sleep(Duration::from_secs(1)).await;
        assert_eq!(monitoring.fetch_count(), 1);

        assert!(handle.pause());
        assert!(handle.pause());
        sleep(Duration::from_secs(200)).await;
        assert_eq!(handle.mode(), Mode::Paused);
        assert_eq!(monitoring.fetch_count(), 1);

        assert!(handle.resume());
        sleep(Duration::from_secs(1)).await;
        assert_eq!(handle.mode(), Mode::Running);
        assert_eq!(monitoring.fetch_count(), 2);

        // Back on the original cadence: the next tick is at t=240.
        sleep(Duration::from_secs(60)).await;
        assert_eq!(monitoring.fetch_count(), 3);

        handle.stop();
        handle.join().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_during_slow_pass_wins_over_due_tick() {
        let (monitoring, _, builder) = setup(5, Bindings::default());
        let handle = builder.interval(Duration::from_secs(60)).build().start();

        sleep(Duration::from_secs(1)).await;
        assert_eq!(monitoring.fetch_count(), 1);

        // The pass starting at t=60 runs until t=150, past the t=120 tick.
        monitoring.set_fetch_delay(Duration::from_secs(90));
        sleep(Duration::from_secs(99)).await;
        assert_eq!(monitoring.fetch_count(), 2);
        assert!(handle.pause());

        sleep(Duration::from_secs(200)).await;
        assert_eq!(handle.mode(), Mode::Paused);
        assert_eq!(monitoring.fetch_count(), 2);

        handle.stop();
        handle.join().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_slow_pass_wins_over_due_tick() {
        let (monitoring, _, builder) = setup(5, Bindings::default());
        let handle = builder.interval(Duration::from_secs(60)).build().start();

        sleep(Duration::from_secs(1)).await;
        monitoring.set_fetch_delay(Duration::from_secs(90));
        sleep(Duration::from_secs(99)).await;
        assert!(handle.stop());

        sleep(Duration::from_secs(100)).await;
        assert_eq!(handle.mode(), Mode::Stopped);
        assert_eq!(monitoring.fetch_count(), 2);
        handle.join().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_while_running_is_ignored() {
        let (monitoring, _, builder) = setup(5, Bindings::default());
        let handle = builder.interval(Duration::from_secs(60)).build().start();

        sleep(Duration::from_secs(1)).await;
        handle.resume();
        sleep(Duration::from_secs(1)).await;
        assert_eq!(monitoring.fetch_count(), 1);

        handle.stop();
        handle.join().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_while_paused() {
        let (monitoring, _, builder) = setup(5, Bindings::default());
        let handle = builder.interval(Duration::from_secs(60)).build().start();

        sleep(Duration::from_secs(1)).await;
        handle.pause();
        handle.stop();
        sleep(Duration::from_secs(1)).await;

        assert_eq!(handle.mode(), Mode::Stopped);
        assert!(!handle.resume());
        handle.join().await.unwrap();
        assert_eq!(monitoring.fetch_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_senders_stops_loop() {
        let (_, _, builder) = setup(5, Bindings::default());
        let scheduler = builder.interval(Duration::from_secs(60)).build();

        let (control, rx) = ControlHandle::channel();
        let task = tokio::spawn(scheduler.run(rx));
        sleep(Duration::from_secs(1)).await;
        drop(control);

        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_account_failure_is_fatal() {
        let (monitoring, _, builder) = setup(5, Bindings::default().component(1, [10]));
        monitoring.fail_account();
        let handle = builder.build().start();

        sleep(Duration::from_secs(1)).await;
        assert_eq!(handle.mode(), Mode::Stopped);

        let err = handle.join().await.unwrap_err();
        assert!(matches!(err, SchedulerError::AccountDetails(_)));
        assert_eq!(monitoring.fetch_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_retried_next_tick() {
        let (monitoring, page, builder) = setup(5, Bindings::default().component(1, [10]));
        monitoring.set_monitors(vec![Monitor::new(1, "api", MonitorStatus::Down)]);
        monitoring.set_failing(true);
        let handle = builder.interval(Duration::from_secs(60)).build().start();

        sleep(Duration::from_secs(1)).await;
        assert_eq!(handle.status().failed_fetches, 1);
        assert!(page.calls().is_empty());

        monitoring.set_failing(false);
        sleep(Duration::from_secs(60)).await;
        assert_eq!(page.calls(), vec![Call::Component(10, 4)]);
        assert_eq!(handle.status().passes, 1);

        handle.stop();
        handle.join().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_failure_isolated_and_not_retried() {
        let (monitoring, page, builder) = setup(5, Bindings::default().component(1, [10, 11]));
        monitoring.set_monitors(vec![Monitor::new(1, "api", MonitorStatus::Down)]);
        page.fail_component(10);
        let handle = builder.interval(Duration::from_secs(60)).build().start();

        sleep(Duration::from_secs(1)).await;
        assert_eq!(page.calls(), vec![Call::Component(10, 4), Call::Component(11, 4)]);
        assert_eq!(page.applied(), vec![Call::Component(11, 4)]);
        assert_eq!(handle.status().last_pass.unwrap().published.failures, 1);

        // Same status next poll: nothing is re-sent.
        sleep(Duration::from_secs(60)).await;
        assert_eq!(page.calls().len(), 2);

        // A real change is published to both components again.
        monitoring.set_monitors(vec![Monitor::new(1, "api", MonitorStatus::Up)]);
        sleep(Duration::from_secs(60)).await;
        assert_eq!(
            &page.calls()[2..],
            &[Call::Component(10, 1), Call::Component(11, 1)]
        );

        handle.stop();
        handle.join().await.unwrap();
    }
}
