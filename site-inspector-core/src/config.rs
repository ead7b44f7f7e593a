//! Inspector configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config file.
//! Environment overrides are applied by [`InspectorConfig::from_env`].

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{InspectorError, InspectorResult};

pub const DEFAULT_AMAZON_RANGES_URL: &str = "https://ip-ranges.amazonaws.com/ip-ranges.json";
pub const DEFAULT_AZURE_RANGES_URL: &str = "https://download.microsoft.com/download/7/1/D/71D86715-5596-4529-9B13-DA13A5DE5B63/ServiceTags_Public_20210426.json";

/// Overrides `cacheDir`.
pub const CACHE_DIR_ENV: &str = "SITE_INSPECTOR_CACHE_DIR";
/// Legacy cache location, consulted when [`CACHE_DIR_ENV`] is unset.
pub const TEMP_FOLDER_ENV: &str = "TEMP_FOLDER";
/// Overrides `nameserver`.
pub const NAMESERVER_ENV: &str = "SITE_INSPECTOR_NAMESERVER";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InspectorConfig {
    /// Recursive resolver every DNS query goes to.
    pub nameserver: String,
    pub dns_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Where monthly range documents and WHOIS answers are kept.
    pub cache_dir: PathBuf,
    pub amazon_ranges_url: String,
    pub azure_ranges_url: String,
    /// Budget for each plugin invocation.
    pub plugin_timeout_secs: u64,
    /// Scraper snapshot mapping OpenShift routes to projects.
    pub openshift_projects_file: Option<PathBuf>,
    /// Scraper snapshot of router hits per OpenShift namespace.
    pub hits_file: Option<PathBuf>,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            nameserver: "1.1.1.1".to_string(),
            dns_timeout_secs: 5,
            connect_timeout_secs: 2,
            request_timeout_secs: 10,
            user_agent: "debug/1.0".to_string(),
            cache_dir: default_cache_dir(),
            amazon_ranges_url: DEFAULT_AMAZON_RANGES_URL.to_string(),
            azure_ranges_url: DEFAULT_AZURE_RANGES_URL.to_string(),
            plugin_timeout_secs: 20,
            openshift_projects_file: None,
            hits_file: None,
        }
    }
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("site-inspector")
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl InspectorConfig {
    /// Defaults with environment overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Read a JSON config file, then apply environment overrides.
    pub fn load(path: &Path) -> InspectorResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            InspectorError::ConfigError(format!("Cannot read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            InspectorError::ConfigError(format!("Invalid config {}: {e}", path.display()))
        })?;
        Ok(config.with_env_overrides())
    }

    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(dir) = non_empty_env(CACHE_DIR_ENV).or_else(|| non_empty_env(TEMP_FOLDER_ENV)) {
            self.cache_dir = PathBuf::from(dir);
        }
        if let Some(nameserver) = non_empty_env(NAMESERVER_ENV) {
            self.nameserver = nameserver;
        }
        self
    }

    /// Check the values and make sure the cache directory exists.
    pub fn validate(&self) -> InspectorResult<()> {
        self.nameserver_addr()?;

        for (name, value) in [
            ("dnsTimeoutSecs", self.dns_timeout_secs),
            ("connectTimeoutSecs", self.connect_timeout_secs),
            ("requestTimeoutSecs", self.request_timeout_secs),
            ("pluginTimeoutSecs", self.plugin_timeout_secs),
        ] {
            if value == 0 {
                return Err(InspectorError::ConfigError(format!(
                    "{name} must be greater than zero"
                )));
            }
        }

        for (name, url) in [
            ("amazonRangesUrl", &self.amazon_ranges_url),
            ("azureRangesUrl", &self.azure_ranges_url),
        ] {
            url::Url::parse(url).map_err(|e| {
                InspectorError::ConfigError(format!("{name} is not a valid URL ({url}): {e}"))
            })?;
        }

        std::fs::create_dir_all(&self.cache_dir).map_err(|e| {
            InspectorError::ConfigError(format!(
                "Cache directory {} is not usable: {e}",
                self.cache_dir.display()
            ))
        })?;

        Ok(())
    }

    pub fn nameserver_addr(&self) -> InspectorResult<IpAddr> {
        self.nameserver.trim().parse().map_err(|_| {
            InspectorError::ConfigError(format!(
                "nameserver must be an IP address, got '{}'",
                self.nameserver
            ))
        })
    }

    pub fn dns_timeout(&self) -> Duration {
        Duration::from_secs(self.dns_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn plugin_timeout(&self) -> Duration {
        Duration::from_secs(self.plugin_timeout_secs)
    }
}
