//! Handles for steering a running scheduler.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::error::SchedulerError;
use crate::scheduler::{Mode, SchedulerStatus};

/// Capacity of the control channel. Senders never wait for the loop.
pub(crate) const CONTROL_CAPACITY: usize = 10;

/// A signal for the control loop.
///
/// Signals are picked up between passes, never in the middle of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Stop polling until [`Control::Resume`]. Idempotent.
    Pause,
    /// Poll immediately, then return to the normal cadence.
    Resume,
    /// End the loop for good.
    Stop,
}

/// Cloneable, non-blocking sender of [`Control`] signals.
///
/// When every `ControlHandle` has been dropped the loop stops, as if
/// [`stop`](Self::stop) had been called.
#[derive(Debug, Clone)]
pub struct ControlHandle {
    tx: mpsc::Sender<Control>,
}

impl ControlHandle {
    /// Create a handle and the receiver the control loop reads from.
    pub fn channel() -> (Self, mpsc::Receiver<Control>) {
        let (tx, rx) = mpsc::channel(CONTROL_CAPACITY);
        (Self { tx }, rx)
    }

    /// Ask the loop to pause.
    pub fn pause(&self) -> bool {
        self.send(Control::Pause)
    }

    /// Ask the loop to resume.
    pub fn resume(&self) -> bool {
        self.send(Control::Resume)
    }

    /// Ask the loop to exit.
    pub fn stop(&self) -> bool {
        self.send(Control::Stop)
    }

    /// Queue a signal without waiting.
    ///
    /// Returns `false` if the signal was dropped because the channel is full
    /// or the loop has already exited.
    pub fn send(&self, signal: Control) -> bool {
        match self.tx.try_send(signal) {
            Ok(()) => true,
            Err(TrySendError::Full(signal)) => {
                warn!(?signal, "control channel full, signal dropped");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

/// Handle to a scheduler spawned with [`Scheduler::start`](crate::Scheduler::start).
///
/// Dropping this handle (and every [`ControlHandle`] cloned from it) stops
/// the loop.
#[derive(Debug)]
pub struct SchedulerHandle {
    pub(crate) control: ControlHandle,
    pub(crate) status: Arc<RwLock<SchedulerStatus>>,
    pub(crate) task: JoinHandle<Result<(), SchedulerError>>,
}

impl SchedulerHandle {
    /// Pause polling.
    pub fn pause(&self) -> bool {
        self.control.pause()
    }

    /// Resume polling with an immediate pass.
    pub fn resume(&self) -> bool {
        self.control.resume()
    }

    /// Stop the loop. Await [`join`](Self::join) to wait for it to exit.
    pub fn stop(&self) -> bool {
        self.control.stop()
    }

    /// A sender that can be handed to other tasks.
    pub fn control(&self) -> ControlHandle {
        self.control.clone()
    }

    /// Current mode of the loop.
    pub fn mode(&self) -> Mode {
        self.status.read().mode
    }

    /// A copy of the loop's bookkeeping.
    pub fn status(&self) -> SchedulerStatus {
        self.status.read().clone()
    }

    /// Wait for the loop to exit.
    pub async fn join(self) -> Result<(), SchedulerError> {
        self.task.await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_signals_arrive_in_order() {
        let (handle, mut rx) = ControlHandle::channel();

        assert!(handle.pause());
        assert!(handle.resume());
        assert!(handle.stop());

        assert_eq!(rx.recv().await, Some(Control::Pause));
        assert_eq!(rx.recv().await, Some(Control::Resume));
        assert_eq!(rx.recv().await, Some(Control::Stop));
    }

    #[test]
    fn test_full_channel_drops_without_blocking() {
        let (handle, _rx) = ControlHandle::channel();

        for _ in 0..CONTROL_CAPACITY {
            assert!(handle.pause());
        }
        assert!(!handle.pause());
    }

    #[test]
    fn test_closed_channel_reports_false() {
        let (handle, rx) = ControlHandle::channel();
        drop(rx);
        assert!(!handle.stop());
    }

    #[tokio::test]
    async fn test_dropping_all_handles_closes_channel() {
        let (handle, mut rx) = ControlHandle::channel();
        let clone = handle.clone();
        drop(handle);
        drop(clone);
        assert_eq!(rx.recv().await, None);
    }
}
