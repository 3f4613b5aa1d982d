//! # upcachet-core
//!
//! The reconciliation and scheduling core of the upcachet bridge.
//!
//! Each pass fetches every monitor, lets the [`Reconciler`] compare it with
//! what the [`StateStore`] last saw, and hands the resulting actions to the
//! [`Publisher`]. The [`Scheduler`] repeats this on a fixed cadence and can be
//! paused, resumed and stopped through a [`ControlHandle`].
//!
//! ```text
//!  Scheduler ──fetch──▶ MonitoringService
//!      │
//!      ▼
//!  Reconciler ◀──▶ StateStore
//!      │ Actions
//!      ▼
//!  Publisher ──update──▶ StatusPageService
//! ```
//!
//! ## Delivery semantics
//!
//! Decisions are committed to the state store before publishing. A status
//! change or a metric sample is published at most once; if the call fails,
//! the next genuine change is what gets through.

mod discovery;
mod error;
mod handle;
mod publisher;
mod reconciler;
mod scheduler;
mod state;

#[cfg(test)]
mod testing;

pub use discovery::{discover, Discovery, EXAMPLE_COMPONENTS, EXAMPLE_MONITOR};
pub use error::SchedulerError;
pub use handle::{Control, ControlHandle, SchedulerHandle};
pub use publisher::{PublishReport, Publisher};
pub use reconciler::Reconciler;
pub use scheduler::{
    derive_interval, Mode, PassReport, Scheduler, SchedulerBuilder, SchedulerStatus,
    FALLBACK_INTERVAL,
};
pub use state::StateStore;
