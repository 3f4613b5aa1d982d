//! Uptime Robot adapter using the v2 HTTP API.
//!
//! Every call is a form-encoded `POST` carrying the account API key. The API
//! answers `200 OK` even for failures and signals them with
//! `"stat": "fail"`, so the envelope is checked on every response.
//!
//! ## Example
//!
//! ```rust,no_run
//! use upcachet_adapters::uptimerobot::UptimeRobotClient;
//! use upcachet_adapters::MonitoringService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = UptimeRobotClient::builder().api_key("u123-abc").build()?;
//!
//!     let account = client.get_account_details().await?;
//!     println!("Monitors are checked every {:?}", account.monitor_interval);
//!
//!     for monitor in client.get_monitors().await? {
//!         println!("{} - {} ({})", monitor.id, monitor.name, monitor.status);
//!     }
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use upcachet_types::{AccountDetails, Monitor, MonitorId, MonitorStatus, ResponseTime};

use crate::{AdapterError, MonitoringService};

const DEFAULT_ENDPOINT: &str = "https://api.uptimerobot.com/v2";

/// Maximum page size accepted by `getMonitors`.
const PAGE_SIZE: usize = 50;

/// Client for the Uptime Robot API.
#[derive(Debug, Clone)]
pub struct UptimeRobotClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl UptimeRobotClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> UptimeRobotClientBuilder {
        UptimeRobotClientBuilder::default()
    }

    async fn post<T>(&self, method: &str, params: &[(&str, String)]) -> Result<T, AdapterError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url = format!("{}/{}", self.endpoint, method);

        let mut form: Vec<(&str, String)> = vec![
            ("api_key", self.api_key.clone()),
            ("format", "json".to_string()),
        ];
        form.extend(params.iter().cloned());

        let response = self.client.post(&url).form(&form).send().await?;

        if !response.status().is_success() {
            return Err(AdapterError::Http(format!(
                "{} returned status {}",
                method,
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AdapterError::Parse(e.to_string()))
    }

    async fn fetch_page(&self, offset: usize) -> Result<MonitorsResponse, AdapterError> {
        let params = [
            ("response_times", "1".to_string()),
            ("offset", offset.to_string()),
            ("limit", PAGE_SIZE.to_string()),
        ];
        let page: MonitorsResponse = self.post("getMonitors", &params).await?;
        check_stat(&page.stat, page.error.as_ref())?;
        Ok(page)
    }
}

#[async_trait]
impl MonitoringService for UptimeRobotClient {
    async fn get_account_details(&self) -> Result<AccountDetails, AdapterError> {
        let response: AccountResponse = self.post("getAccountDetails", &[]).await?;
        check_stat(&response.stat, response.error.as_ref())?;

        response
            .account
            .map(AccountInfo::into_details)
            .ok_or_else(|| AdapterError::Parse("missing account in response".to_string()))
    }

    async fn get_monitors(&self) -> Result<Vec<Monitor>, AdapterError> {
        let mut monitors = Vec::new();

        loop {
            let page = self.fetch_page(monitors.len()).await?;
            let received = page.monitors.len();
            monitors.extend(page.monitors.into_iter().map(MonitorInfo::into_monitor));

            let total = page.pagination.map(|p| p.total).unwrap_or(monitors.len());
            debug!(received, total, "fetched monitor page");

            if received == 0 || monitors.len() >= total {
                break;
            }
        }

        Ok(monitors)
    }
}

/// Builder for UptimeRobotClient.
#[derive(Debug, Default)]
pub struct UptimeRobotClientBuilder {
    endpoint: Option<String>,
    api_key: Option<String>,
    timeout: Option<Duration>,
}

impl UptimeRobotClientBuilder {
    /// Set the API base URL (default: "https://api.uptimerobot.com/v2").
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the account API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set a request timeout. Without one, the transport default applies.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<UptimeRobotClient, AdapterError> {
        let mut client = Client::builder();
        if let Some(timeout) = self.timeout {
            client = client.timeout(timeout);
        }

        Ok(UptimeRobotClient {
            client: client.build()?,
            endpoint: self
                .endpoint
                .map(|e| e.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            api_key: self.api_key.unwrap_or_default(),
        })
    }
}

fn check_stat(stat: &str, error: Option<&ApiError>) -> Result<(), AdapterError> {
    if stat == "ok" {
        return Ok(());
    }

    match error {
        Some(err) if err.parameter_name.as_deref() == Some("api_key") => {
            Err(AdapterError::Auth(err.describe()))
        }
        Some(err) => Err(AdapterError::Api(err.describe())),
        None => Err(AdapterError::Api(format!("stat was '{}'", stat))),
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    parameter_name: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ApiError {
    fn describe(&self) -> String {
        match (&self.kind, &self.message) {
            (Some(kind), Some(message)) => format!("{}: {}", kind, message),
            (None, Some(message)) => message.clone(),
            (Some(kind), None) => kind.clone(),
            (None, None) => "unspecified error".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    stat: String,
    #[serde(default)]
    error: Option<ApiError>,
    #[serde(default)]
    account: Option<AccountInfo>,
}

/// Account information from `getAccountDetails`.
#[derive(Debug, Deserialize)]
struct AccountInfo {
    #[serde(default)]
    email: String,
    #[serde(default)]
    monitor_limit: u32,
    /// Minutes between checks.
    #[serde(default)]
    monitor_interval: u64,
    #[serde(default)]
    up_monitors: u32,
    #[serde(default)]
    down_monitors: u32,
    #[serde(default)]
    paused_monitors: u32,
}

impl AccountInfo {
    fn into_details(self) -> AccountDetails {
        AccountDetails {
            email: self.email,
            monitor_limit: self.monitor_limit,
            monitor_interval: Duration::from_secs(self.monitor_interval * 60),
            up_monitors: self.up_monitors,
            down_monitors: self.down_monitors,
            paused_monitors: self.paused_monitors,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MonitorsResponse {
    stat: String,
    #[serde(default)]
    error: Option<ApiError>,
    #[serde(default)]
    pagination: Option<Pagination>,
    #[serde(default)]
    monitors: Vec<MonitorInfo>,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    total: usize,
}

/// Monitor entry from `getMonitors`.
#[derive(Debug, Deserialize)]
struct MonitorInfo {
    id: MonitorId,
    #[serde(default)]
    friendly_name: String,
    status: u8,
    #[serde(default)]
    response_times: Vec<ResponseTimeInfo>,
}

impl MonitorInfo {
    fn into_monitor(self) -> Monitor {
        Monitor {
            id: self.id,
            name: self.friendly_name,
            status: MonitorStatus::from(self.status),
            response_times: self
                .response_times
                .into_iter()
                .map(|rt| ResponseTime::new(rt.value, rt.datetime))
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResponseTimeInfo {
    datetime: u64,
    value: u32,
}
