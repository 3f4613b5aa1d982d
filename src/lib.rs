//! # upcachet
//!
//! Mirrors Uptime Robot monitors onto a Cachet status page.
//!
//! Monitor status changes are translated into component status updates, and
//! new response-time samples are appended as metric points. The bridge polls
//! on a fixed cadence, derived from the account's check interval unless one
//! is configured.
//!
//! ```text
//! ┌──────────────┐   poll    ┌───────────────┐   update   ┌────────────┐
//! │ Uptime Robot │──────────▶│ upcachet-core │───────────▶│   Cachet   │
//! └──────────────┘           └───────┬───────┘            └────────────┘
//!                                    │
//!                        config.json + UPCACHET_* env
//! ```
//!
//! This crate holds the binary's glue:
//!
//! - **[`config`]**: layered settings and the persisted config file
//! - **[`duration`]**: human-friendly durations such as `90s` or `5m`
//! - **[`liveness`]**: optional HTTP endpoint answering at `/`
//! - **[`signals`]**: pause, resume and stop from process signals
//!
//! The reconciliation logic lives in [`upcachet_core`], the HTTP clients in
//! [`upcachet_adapters`] and the shared data model in [`upcachet_types`].

pub mod config;
pub mod duration;
pub mod liveness;
pub mod signals;

pub use config::{ConfigFile, Settings};
