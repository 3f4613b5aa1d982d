//! # upcachet-types
//!
//! Core types for the upcachet bridge. Everything the reconciliation core
//! reads or produces is defined here so the remote adapters and the core can
//! agree on a single vocabulary without depending on each other's internals.
//!
//! ## Features
//!
//! - `serde`: serialization for monitors, actions and bindings
//!
//! ## Example
//!
//! ```rust
//! use upcachet_types::{Bindings, ComponentStatus, MonitorStatus};
//!
//! let bindings = Bindings::default()
//!     .component(1, [10, 11])
//!     .metric(1, [99]);
//!
//! assert_eq!(bindings.translate(MonitorStatus::Down), Some(ComponentStatus::MAJOR_OUTAGE));
//! assert_eq!(bindings.components_for(1), &[10, 11]);
//! ```

mod action;
mod bindings;
mod component;
mod monitor;

pub use action::*;
pub use bindings::*;
pub use component::*;
pub use monitor::*;

/// Identifier of a monitor on the monitoring service.
pub type MonitorId = u64;

/// Identifier of a component on the status page.
pub type ComponentId = u64;

/// Identifier of a metric series on the status page.
pub type MetricId = u64;
