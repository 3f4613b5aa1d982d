//! Monitors as reported by the monitoring service.

use std::fmt;
use std::time::Duration;

use crate::MonitorId;

/// Health status of a monitor.
///
/// The numeric codes are those used by the monitoring service. Codes this
/// crate does not know about are kept verbatim in [`MonitorStatus::Unknown`]
/// so a translation can still be configured for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "u8", into = "u8")
)]
pub enum MonitorStatus {
    Paused,
    NotCheckedYet,
    Up,
    SeemsDown,
    Down,
    Unknown(u8),
}

impl MonitorStatus {
    /// The numeric code of this status.
    pub fn code(self) -> u8 {
        match self {
            MonitorStatus::Paused => 0,
            MonitorStatus::NotCheckedYet => 1,
            MonitorStatus::Up => 2,
            MonitorStatus::SeemsDown => 8,
            MonitorStatus::Down => 9,
            MonitorStatus::Unknown(code) => code,
        }
    }
}

impl From<u8> for MonitorStatus {
    fn from(code: u8) -> Self {
        match code {
            0 => MonitorStatus::Paused,
            1 => MonitorStatus::NotCheckedYet,
            2 => MonitorStatus::Up,
            8 => MonitorStatus::SeemsDown,
            9 => MonitorStatus::Down,
            other => MonitorStatus::Unknown(other),
        }
    }
}

impl From<MonitorStatus> for u8 {
    fn from(status: MonitorStatus) -> Self {
        status.code()
    }
}

impl fmt::Display for MonitorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorStatus::Paused => f.write_str("paused"),
            MonitorStatus::NotCheckedYet => f.write_str("not checked yet"),
            MonitorStatus::Up => f.write_str("up"),
            MonitorStatus::SeemsDown => f.write_str("seems down"),
            MonitorStatus::Down => f.write_str("down"),
            MonitorStatus::Unknown(code) => write!(f, "unknown ({})", code),
        }
    }
}

/// A single response-time sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResponseTime {
    /// Response time in milliseconds.
    pub value: u32,

    /// Unix timestamp (seconds) at which the sample was taken.
    pub timestamp: u64,
}

impl ResponseTime {
    /// Create a sample.
    pub fn new(value: u32, timestamp: u64) -> Self {
        Self { value, timestamp }
    }
}

/// A monitor as observed in one fetch.
///
/// Snapshots are replaced wholesale on every poll, never patched.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Monitor {
    pub id: MonitorId,
    pub name: String,
    pub status: MonitorStatus,

    /// Recent samples. The monitoring service returns them newest first.
    #[cfg_attr(feature = "serde", serde(default))]
    pub response_times: Vec<ResponseTime>,
}

impl Monitor {
    /// Create a monitor with no samples.
    pub fn new(id: MonitorId, name: impl Into<String>, status: MonitorStatus) -> Self {
        Self {
            id,
            name: name.into(),
            status,
            response_times: Vec::new(),
        }
    }

    /// Append a sample (builder style).
    pub fn with_sample(mut self, value: u32, timestamp: u64) -> Self {
        self.response_times.push(ResponseTime::new(value, timestamp));
        self
    }

    /// The most recent sample, by timestamp.
    ///
    /// Picks the maximum timestamp rather than trusting the position of the
    /// first element. Ties keep the earliest entry in the sequence.
    pub fn latest_sample(&self) -> Option<&ResponseTime> {
        self.response_times
            .iter()
            .reduce(|best, s| if s.timestamp > best.timestamp { s } else { best })
    }
}

/// Account metadata from the monitoring service.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccountDetails {
    pub email: String,
    pub monitor_limit: u32,

    /// How often the monitoring service checks each monitor.
    pub monitor_interval: Duration,
    pub up_monitors: u32,
    pub down_monitors: u32,
    pub paused_monitors: u32,
}

impl AccountDetails {
    /// Number of monitors in use on the account.
    pub fn monitors_in_use(&self) -> u32 {
        self.up_monitors + self.down_monitors + self.paused_monitors
    }
}
