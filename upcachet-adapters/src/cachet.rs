//! Cachet adapter using the v1 HTTP API.
//!
//! Writes (component updates and metric points) authenticate with the
//! `X-Cachet-Token` header. Reads work without a token on most installs but
//! send it anyway when one is configured.
//!
//! ## Example
//!
//! ```rust,no_run
//! use upcachet_adapters::cachet::CachetClient;
//! use upcachet_adapters::{ComponentStatus, StatusPageService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = CachetClient::builder()
//!         .endpoint("https://status.example.com")
//!         .api_key("token")
//!         .build()?;
//!
//!     client.ping().await?;
//!     client
//!         .update_component_status(1, ComponentStatus::MAJOR_OUTAGE)
//!         .await?;
//!     client.append_metric_point(3, 240, 1_700_000_000).await?;
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use upcachet_types::{Component, ComponentId, ComponentStatus, MetricId};

use crate::{AdapterError, StatusPageService};

const TOKEN_HEADER: &str = "X-Cachet-Token";

/// Client for a Cachet status page.
#[derive(Debug, Clone)]
pub struct CachetClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl CachetClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> CachetClientBuilder {
        CachetClientBuilder::default()
    }

    /// Check that the endpoint is a reachable Cachet API.
    pub async fn ping(&self) -> Result<(), AdapterError> {
        let response = self.request(self.client.get(self.url("ping"))).send().await?;
        let response = check_status(response, "ping").await?;

        let pong: DataEnvelope<String> = response
            .json()
            .await
            .map_err(|e| AdapterError::Parse(e.to_string()))?;
        debug!(reply = %pong.data, "cachet ping");
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.endpoint, path)
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header(TOKEN_HEADER, key),
            None => builder,
        }
    }

    async fn fetch_components_page(&self, page: u32) -> Result<ComponentsResponse, AdapterError> {
        let builder = self
            .client
            .get(self.url("components"))
            .query(&[("page", page)]);
        let response = self.request(builder).send().await?;
        let response = check_status(response, "list components").await?;

        response
            .json()
            .await
            .map_err(|e| AdapterError::Parse(e.to_string()))
    }
}

#[async_trait]
impl StatusPageService for CachetClient {
    async fn update_component_status(
        &self,
        component: ComponentId,
        status: ComponentStatus,
    ) -> Result<(), AdapterError> {
        let body = ComponentUpdate {
            id: component,
            status: status.code(),
            enabled: true,
        };
        let builder = self
            .client
            .put(self.url(&format!("components/{}", component)))
            .json(&body);

        let response = self.request(builder).send().await?;
        check_status(response, &format!("update component {}", component)).await?;
        Ok(())
    }

    async fn append_metric_point(
        &self,
        metric: MetricId,
        value: u32,
        timestamp: u64,
    ) -> Result<(), AdapterError> {
        let body = MetricPoint { value, timestamp };
        let builder = self
            .client
            .post(self.url(&format!("metrics/{}/points", metric)))
            .json(&body);

        let response = self.request(builder).send().await?;
        check_status(response, &format!("add point to metric {}", metric)).await?;
        Ok(())
    }

    async fn list_components(&self) -> Result<Vec<Component>, AdapterError> {
        let mut components = Vec::new();
        let mut page = 1;

        loop {
            let response = self.fetch_components_page(page).await?;
            let total_pages = response
                .meta
                .and_then(|m| m.pagination)
                .map(|p| p.total_pages)
                .unwrap_or(1);

            components.extend(
                response
                    .data
                    .into_iter()
                    .map(|c| Component::new(c.id, c.name)),
            );

            if page >= total_pages {
                break;
            }
            page += 1;
        }

        Ok(components)
    }
}

/// Builder for CachetClient.
#[derive(Debug, Default)]
pub struct CachetClientBuilder {
    endpoint: Option<String>,
    api_key: Option<String>,
    timeout: Option<Duration>,
}

impl CachetClientBuilder {
    /// Set the status page base URL (e.g., "https://status.example.com").
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the API token.
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
    pub fn build(self) -> Result<CachetClient, AdapterError> {
        let mut client = Client::builder();
        if let Some(timeout) = self.timeout {
            client = client.timeout(timeout);
        }

        Ok(CachetClient {
            client: client.build()?,
            endpoint: normalize_endpoint(
                self.endpoint
                    .as_deref()
                    .unwrap_or("http://localhost"),
            ),
            api_key: self.api_key.filter(|k| !k.is_empty()),
        })
    }
}

/// Strip a trailing slash and an `/api/v1` suffix so both forms are accepted.
fn normalize_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim_end_matches('/');
    trimmed
        .strip_suffix("/api/v1")
        .unwrap_or(trimmed)
        .to_string()
}

async fn check_status(response: Response, what: &str) -> Result<Response, AdapterError> {
    let status = response.status();

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(AdapterError::Auth(format!("{} rejected with {}", what, status)));
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AdapterError::Http(format!(
            "{} returned status {}: {}",
            what,
            status,
            body.trim()
        )));
    }

    Ok(response)
}

#[derive(Debug, Serialize)]
struct ComponentUpdate {
    id: ComponentId,
    status: u8,
    enabled: bool,
}

#[derive(Debug, Serialize)]
struct MetricPoint {
    value: u32,
    timestamp: u64,
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ComponentsResponse {
    #[serde(default)]
    meta: Option<Meta>,
    #[serde(default)]
    data: Vec<ComponentInfo>,
}

#[derive(Debug, Deserialize)]
struct Meta {
    #[serde(default)]
    pagination: Option<PageInfo>,
}

#[derive(Debug, Deserialize)]
struct PageInfo {
    total_pages: u32,
}

#[derive(Debug, Deserialize)]
struct ComponentInfo {
    id: ComponentId,
    #[serde(default)]
    name: String,
}
