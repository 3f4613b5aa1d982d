//! Configuration loading and persistence.
//!
//! Settings are layered with the `config` crate: built-in defaults, then the
//! JSON config file, then `UPCACHET_*` environment variables. Only the first
//! two layers are ever written back, so credentials passed through the
//! environment stay out of the file.
//!
//! ```json
//! {
//!     "monitor_components": { "777749809": [1, 2] },
//!     "monitor_metrics": { "777749809": [1] },
//!     "monitor_component_statuses": { "9": 4, "2": 1 },
//!     "check_interval": "90s",
//!     "cachet_apikey": "",
//!     "cachet_endpoint": "https://status.example.com",
//!     "uptimerobot_apikey": "",
//!     "bind_address": null
//! }
//! ```

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use upcachet_types::{default_translation, Bindings, ComponentStatus, MonitorStatus};

use crate::duration::parse_duration;

/// Config file used when neither `--config` nor `UPCACHET_CONFIG_FILE` is set.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Prefix of environment variable overrides.
pub const ENV_PREFIX: &str = "UPCACHET";

/// Application settings, as stored in the config file.
///
/// Map keys are decimal monitor IDs (or monitor status codes for
/// `monitor_component_statuses`), since JSON object keys are strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub monitor_components: BTreeMap<String, Vec<u64>>,
    pub monitor_metrics: BTreeMap<String, Vec<u64>>,
    pub monitor_component_statuses: BTreeMap<String, u8>,
    /// Poll interval such as "90s". Derived from the account when unset.
    pub check_interval: Option<String>,
    pub cachet_apikey: String,
    pub cachet_endpoint: String,
    pub uptimerobot_apikey: String,
    /// Address for the liveness listener. Disabled when unset.
    pub bind_address: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            monitor_components: BTreeMap::new(),
            monitor_metrics: BTreeMap::new(),
            monitor_component_statuses: default_translation()
                .into_iter()
                .map(|(from, to)| (from.code().to_string(), to.code()))
                .collect(),
            check_interval: None,
            cachet_apikey: String::new(),
            cachet_endpoint: String::new(),
            uptimerobot_apikey: String::new(),
            bind_address: None,
        }
    }
}

impl Settings {
    /// Build the typed bindings from the string-keyed maps.
    pub fn bindings(&self) -> Result<Bindings> {
        let mut bindings = Bindings::empty();

        for (key, components) in &self.monitor_components {
            bindings = bindings.component(parse_id(key, "monitor_components")?, components.clone());
        }
        for (key, metrics) in &self.monitor_metrics {
            bindings = bindings.metric(parse_id(key, "monitor_metrics")?, metrics.clone());
        }
        for (key, code) in &self.monitor_component_statuses {
            let status: u8 = key.trim().parse().with_context(|| {
                format!("monitor_component_statuses: '{}' is not a monitor status code", key)
            })?;
            bindings = bindings.status(MonitorStatus::from(status), ComponentStatus(*code));
        }

        Ok(bindings)
    }

    /// The explicit poll interval, if one is configured.
    pub fn check_interval(&self) -> Result<Option<Duration>> {
        match self.check_interval.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => parse_duration(s)
                .map(Some)
                .with_context(|| format!("invalid check_interval '{}'", s)),
        }
    }

    /// The Cachet endpoint, which must be set.
    pub fn cachet_endpoint(&self) -> Result<&str> {
        required(
            &self.cachet_endpoint,
            "Please specify a Cachet endpoint either through the config file, \
             or through environment variable UPCACHET_CACHET_ENDPOINT",
        )
    }

    /// The Cachet API key, which must be set.
    pub fn cachet_apikey(&self) -> Result<&str> {
        required(
            &self.cachet_apikey,
            "Please specify a Cachet API key either through the config file, \
             or through environment variable UPCACHET_CACHET_APIKEY",
        )
    }

    /// The Uptime Robot API key, which must be set.
    pub fn uptimerobot_apikey(&self) -> Result<&str> {
        required(
            &self.uptimerobot_apikey,
            "Please specify an Uptime Robot API key either through the config file, \
             or through environment variable UPCACHET_UPTIMEROBOT_APIKEY",
        )
    }

    /// The liveness listener address, if enabled.
    pub fn bind_address(&self) -> Result<Option<SocketAddr>> {
        match self.bind_address.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(addr) => addr
                .parse()
                .map(Some)
                .with_context(|| format!("invalid bind_address '{}'", addr)),
        }
    }
}

/// A config file on disk together with the settings it produced.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
    /// Defaults plus file contents. This is what [`save`](Self::save) writes.
    pub stored: Settings,
    /// `stored` with environment overrides applied.
    pub effective: Settings,
    /// True when the file did not exist and was created with defaults.
    pub created: bool,
}

impl ConfigFile {
    /// Load the config file, creating it with defaults if it does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_env(path, Environment::with_prefix(ENV_PREFIX))
    }

    /// Load with an explicit environment source.
    pub fn load_with_env(path: impl AsRef<Path>, env: Environment) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let created = !path.exists();

        let stored: Settings = layers(&path)?
            .build()
            .and_then(Config::try_deserialize)
            .with_context(|| format!("failed to read config file {}", path.display()))?;

        let effective: Settings = layers(&path)?
            .add_source(env)
            .build()
            .and_then(Config::try_deserialize)
            .context("failed to apply environment overrides")?;

        let file = Self {
            path,
            stored,
            effective,
            created,
        };

        if created {
            file.save()?;
        }

        Ok(file)
    }

    /// Path of the config file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the stored settings as pretty-printed JSON.
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.stored)?;
        std::fs::write(&self.path, json + "\n")
            .with_context(|| format!("failed to write config file {}", self.path.display()))
    }
}

fn layers(path: &Path) -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
    let defaults = Config::try_from(&Settings::default())?;

    Ok(Config::builder()
        .add_source(defaults)
        .add_source(File::from(path).format(FileFormat::Json).required(false)))
}

fn parse_id(key: &str, field: &str) -> Result<u64> {
    key.trim()
        .parse()
        .map_err(|_| anyhow!("{}: '{}' is not a monitor ID", field, key))
}

fn required<'a>(value: &'a str, message: &str) -> Result<&'a str> {
    if value.trim().is_empty() {
        bail!("{}", message);
    }
    Ok(value)
}
