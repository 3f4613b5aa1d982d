//! # upcachet-adapters
//!
//! The two remote collaborators of the bridge, expressed as traits, plus
//! ready-made HTTP clients for them.
//!
//! ## Supported Services
//!
//! - **Uptime Robot** (`uptimerobot` feature) - account details and monitors
//!   with response times via the v2 API
//! - **Cachet** (`cachet` feature) - component status updates, metric points
//!   and component listing via the v1 API
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use upcachet_adapters::cachet::CachetClient;
//! use upcachet_adapters::uptimerobot::UptimeRobotClient;
//! use upcachet_adapters::MonitoringService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let uptime = UptimeRobotClient::builder().api_key("u123-abc").build()?;
//!     let cachet = CachetClient::builder()
//!         .endpoint("https://status.example.com")
//!         .api_key("token")
//!         .build()?;
//!
//!     cachet.ping().await?;
//!     let monitors = uptime.get_monitors().await?;
//!     println!("Fetched {} monitors", monitors.len());
//!     Ok(())
//! }
//! ```

pub mod error;
mod service;

#[cfg(feature = "uptimerobot")]
pub mod uptimerobot;

#[cfg(feature = "cachet")]
pub mod cachet;

pub use error::AdapterError;
pub use service::{MonitoringService, StatusPageService};

// Re-export types for convenience
pub use upcachet_types::{
    AccountDetails, Component, ComponentId, ComponentStatus, MetricId, Monitor, MonitorStatus,
};
