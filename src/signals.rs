//! Operator signals.
//!
//! On unix, `SIGUSR1` pauses polling and `SIGUSR2` resumes it. Ctrl-C and
//! `SIGTERM` stop the scheduler so it can exit cleanly.

use tokio::task::JoinHandle;
use tracing::info;

use upcachet_core::ControlHandle;

/// Forward process signals to `control` on a background task.
///
/// The task ends after a stop has been forwarded.
pub fn forward(control: ControlHandle) -> std::io::Result<JoinHandle<()>> {
    imp::forward(control)
}

#[cfg(unix)]
mod imp {
    use super::*;
    use tokio::signal::unix::{signal, SignalKind};

    pub(super) fn forward(control: ControlHandle) -> std::io::Result<JoinHandle<()>> {
        let mut terminate = signal(SignalKind::terminate())?;
        let mut interrupt = signal(SignalKind::interrupt())?;
        let mut pause = signal(SignalKind::user_defined1())?;
        let mut resume = signal(SignalKind::user_defined2())?;

        Ok(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = terminate.recv() => {
                        info!("received SIGTERM, stopping");
                        control.stop();
                        break;
                    }
                    _ = interrupt.recv() => {
                        info!("received interrupt, stopping");
                        control.stop();
                        break;
                    }
                    _ = pause.recv() => {
                        info!("received SIGUSR1, pausing");
                        control.pause();
                    }
                    _ = resume.recv() => {
                        info!("received SIGUSR2, resuming");
                        control.resume();
                    }
                }
            }
        }))
    }
}

#[cfg(not(unix))]
mod imp {
    use super::*;

    pub(super) fn forward(control: ControlHandle) -> std::io::Result<JoinHandle<()>> {
        Ok(tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("received interrupt, stopping");
                control.stop();
            }
        }))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use nix::sys::signal::{raise, Signal};
    use upcachet_core::Control;

    #[tokio::test]
    async fn test_user_signals_pause_and_resume() {
        let (control, mut rx) = ControlHandle::channel();
        let task = forward(control).unwrap();

        raise(Signal::SIGUSR1).unwrap();
        assert_eq!(rx.recv().await, Some(Control::Pause));

        raise(Signal::SIGUSR2).unwrap();
        assert_eq!(rx.recv().await, Some(Control::Resume));

        task.abort();
    }
}
