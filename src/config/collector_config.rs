//! Settings shared by the poller, the reconciler and the Open Data Hub client.
//!
//! A config is always passed in explicitly; nothing reads ambient state, so tests can
//! point a collector at an isolated temporary store.

use crate::config::error::ConfigError;
use crate::source::open_data_hub::{DEFAULT_API_BASE, DEFAULT_PAGE_LIMIT};
use crate::utils::default_store_path;
use bon::bon;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Collector configuration.
///
/// Deserializable from TOML; every key is optional and falls back to [`Default`].
///
/// ```toml
/// store_path = "data/parking_data_dolomites.csv"
/// origins = ["GARDENA", "skidata"]
/// request_timeout_secs = 30
/// poll_interval_secs = 300
/// min_latitude = 46.55
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// CSV file observations are persisted to.
    pub store_path: PathBuf,
    /// Base of the `flat/ParkingStation` API.
    pub api_base: String,
    /// Data origins requested from the API (`sorigin` filter). Empty means all origins.
    pub origins: Vec<String>,
    /// Records per page.
    pub page_limit: usize,
    /// Pause between page requests.
    pub page_delay_ms: u64,
    /// Pause between backfill runs.
    pub run_delay_ms: u64,
    /// Upper bound for each HTTP request. Must be non-zero.
    pub request_timeout_secs: u64,
    /// Pause between poll cycles.
    pub poll_interval_secs: u64,
    /// Stations south of this latitude (Bolzano) are excluded. `None` keeps everything.
    pub min_latitude: Option<f64>,
    pub user_agent: String,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            api_base: DEFAULT_API_BASE.to_string(),
            origins: vec!["GARDENA".to_string(), "skidata".to_string()],
            page_limit: DEFAULT_PAGE_LIMIT,
            page_delay_ms: 100,
            run_delay_ms: 200,
            request_timeout_secs: 30,
            poll_interval_secs: 300,
            min_latitude: Some(46.55),
            user_agent: format!("parking-collector/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[bon]
impl CollectorConfig {
    /// Builds a config, taking [`Default`] values for anything not set.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the resulting config fails [`CollectorConfig::validate`].
    #[builder]
    pub fn new(
        store_path: Option<PathBuf>,
        api_base: Option<String>,
        origins: Option<Vec<String>>,
        page_limit: Option<usize>,
        page_delay: Option<Duration>,
        run_delay: Option<Duration>,
        request_timeout: Option<Duration>,
        poll_interval: Option<Duration>,
        min_latitude: Option<f64>,
        keep_all_latitudes: Option<bool>,
        user_agent: Option<String>,
    ) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            store_path: store_path.unwrap_or(defaults.store_path),
            api_base: api_base.unwrap_or(defaults.api_base),
            origins: origins.unwrap_or(defaults.origins),
            page_limit: page_limit.unwrap_or(defaults.page_limit),
            page_delay_ms: page_delay.map_or(defaults.page_delay_ms, |d| d.as_millis() as u64),
            run_delay_ms: run_delay.map_or(defaults.run_delay_ms, |d| d.as_millis() as u64),
            request_timeout_secs: request_timeout
                .map_or(defaults.request_timeout_secs, |d| d.as_secs()),
            poll_interval_secs: poll_interval.map_or(defaults.poll_interval_secs, |d| d.as_secs()),
            min_latitude: if keep_all_latitudes.unwrap_or(false) {
                None
            } else {
                min_latitude.or(defaults.min_latitude)
            },
            user_agent: user_agent.unwrap_or(defaults.user_agent),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a TOML config file.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        let config: Self =
            toml::from_str(&text).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        if self.page_limit == 0 {
            return Err(ConfigError::InvalidPageLimit);
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn run_delay(&self) -> Duration {
        Duration::from_millis(self.run_delay_ms)
    }
}
