//! Runtime configuration: provider credentials, endpoints, timeouts and the
//! data directory.
//!
//! Values come from an optional TOML file and are then overridden by
//! environment variables. Every field has a default, so an empty file (or no
//! file) is valid apart from the OpenWeatherMap keys, which are required.

use crate::fallback::credential_list::CredentialList;
use crate::fallback::error::FetchError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const ENV_OPENWEATHER_API_KEYS: &str = "OPENWEATHER_API_KEYS";
pub const ENV_EARTHDATA_TOKENS: &str = "EARTHDATA_TOKENS";
pub const ENV_OPENAI_API_KEYS: &str = "OPENAI_API_KEYS";
pub const ENV_OPENAI_MODEL: &str = "OPENAI_MODEL";
pub const ENV_DATA_DIR: &str = "AIR_MONITOR_DATA_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file '{0}'")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("No credentials configured for {provider} (set {env_var})")]
    MissingCredentials {
        provider: &'static str,
        env_var: &'static str,
    },

    #[error("Invalid credential list for {provider}")]
    InvalidCredentials {
        provider: &'static str,
        #[source]
        source: FetchError,
    },

    #[error("Satellite lookups need a granule decoder, none was configured")]
    MissingGranuleDecoder,
}

/// Base URLs of the upstream providers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub openweather: String,
    pub open_meteo: String,
    pub elevation: String,
    pub cmr: String,
    pub daymet: String,
    pub openai: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            openweather: "https://api.openweathermap.org".to_string(),
            open_meteo: "https://api.open-meteo.com".to_string(),
            elevation: "https://api.open-elevation.com".to_string(),
            cmr: "https://cmr.earthdata.nasa.gov".to_string(),
            daymet: "https://daymet.ornl.gov".to_string(),
            openai: "https://api.openai.com".to_string(),
        }
    }
}

impl Endpoints {
    /// Points every provider at one base URL. Used with mock servers.
    pub fn all(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        Self {
            openweather: base.clone(),
            open_meteo: base.clone(),
            elevation: base.clone(),
            cmr: base.clone(),
            daymet: base.clone(),
            openai: base,
        }
    }
}

/// Per-call timeouts in seconds. Exceeding one is a network error.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub pollution_secs: u64,
    pub geocoding_secs: u64,
    pub weather_secs: u64,
    pub elevation_secs: u64,
    pub satellite_search_secs: u64,
    pub satellite_download_secs: u64,
    pub climate_secs: u64,
    pub advice_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            pollution_secs: 10,
            geocoding_secs: 10,
            weather_secs: 10,
            elevation_secs: 10,
            satellite_search_secs: 30,
            satellite_download_secs: 30,
            climate_secs: 30,
            advice_secs: 30,
        }
    }
}

impl Timeouts {
    pub fn pollution(&self) -> Duration {
        Duration::from_secs(self.pollution_secs)
    }
    pub fn geocoding(&self) -> Duration {
        Duration::from_secs(self.geocoding_secs)
    }
    pub fn weather(&self) -> Duration {
        Duration::from_secs(self.weather_secs)
    }
    pub fn elevation(&self) -> Duration {
        Duration::from_secs(self.elevation_secs)
    }
    pub fn satellite_search(&self) -> Duration {
        Duration::from_secs(self.satellite_search_secs)
    }
    pub fn satellite_download(&self) -> Duration {
        Duration::from_secs(self.satellite_download_secs)
    }
    pub fn climate(&self) -> Duration {
        Duration::from_secs(self.climate_secs)
    }
    pub fn advice(&self) -> Duration {
        Duration::from_secs(self.advice_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub openweather_api_keys: Vec<String>,
    pub earthdata_tokens: Vec<String>,
    pub openai_api_keys: Vec<String>,
    pub openai_model: String,
    /// Where satellite granules are downloaded. Defaults to the user cache dir.
    pub data_dir: Option<PathBuf>,
    /// How many days back from the end date to search for granules.
    pub satellite_search_days: u32,
    /// Most climate rows returned in one response.
    pub climate_row_cap: usize,
    pub endpoints: Endpoints,
    pub timeouts: Timeouts,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            openweather_api_keys: Vec::new(),
            earthdata_tokens: Vec::new(),
            openai_api_keys: Vec::new(),
            openai_model: "gpt-4o-mini".to_string(),
            data_dir: None,
            satellite_search_days: 30,
            climate_row_cap: 100,
            endpoints: Endpoints::default(),
            timeouts: Timeouts::default(),
        }
    }
}

impl MonitorConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Reads the TOML file at `path` and applies environment overrides.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        let mut config =
            Self::from_toml_str(&raw).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Defaults plus environment overrides, no file.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides(|name| std::env::var(name).ok());
        config
    }

    /// Overrides fields from variables returned by `lookup`. Credential
    /// variables hold comma separated lists.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let split = |raw: String| -> Vec<String> {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        };

        if let Some(raw) = lookup(ENV_OPENWEATHER_API_KEYS) {
            self.openweather_api_keys = split(raw);
        }
        if let Some(raw) = lookup(ENV_EARTHDATA_TOKENS) {
            self.earthdata_tokens = split(raw);
        }
        if let Some(raw) = lookup(ENV_OPENAI_API_KEYS) {
            self.openai_api_keys = split(raw);
        }
        if let Some(model) = lookup(ENV_OPENAI_MODEL).filter(|m| !m.trim().is_empty()) {
            self.openai_model = model.trim().to_string();
        }
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|d| !d.trim().is_empty()) {
            self.data_dir = Some(PathBuf::from(dir.trim()));
        }
    }

    pub fn openweather_credentials(&self) -> Result<CredentialList, ConfigError> {
        if self.openweather_api_keys.is_empty() {
            return Err(ConfigError::MissingCredentials {
                provider: "OpenWeatherMap",
                env_var: ENV_OPENWEATHER_API_KEYS,
            });
        }
        CredentialList::new(self.openweather_api_keys.iter().cloned()).map_err(|source| {
            ConfigError::InvalidCredentials {
                provider: "OpenWeatherMap",
                source,
            }
        })
    }

    /// `None` when no token is configured.
    pub fn earthdata_credentials(&self) -> Option<CredentialList> {
        CredentialList::new(self.earthdata_tokens.iter().cloned()).ok()
    }

    /// `None` when no key is configured; advice then comes from the rule table.
    pub fn openai_credentials(&self) -> Option<CredentialList> {
        CredentialList::new(self.openai_api_keys.iter().cloned()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_from_empty_document() {
        let config = MonitorConfig::from_toml_str("").unwrap();
        assert_eq!(config, MonitorConfig::default());
        assert_eq!(config.timeouts.pollution(), Duration::from_secs(10));
        assert_eq!(config.timeouts.satellite_search(), Duration::from_secs(30));
        assert_eq!(config.satellite_search_days, 30);
        assert_eq!(config.climate_row_cap, 100);
    }

    #[test]
    fn test_partial_document() {
        let config = MonitorConfig::from_toml_str(
            r#"
            openweather_api_keys = ["a", "b", "a"]
            data_dir = "/var/lib/air"

            [endpoints]
            openweather = "http://localhost:9000"

            [timeouts]
            pollution_secs = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.endpoints.openweather, "http://localhost:9000");
        assert_eq!(config.endpoints.cmr, Endpoints::default().cmr);
        assert_eq!(config.timeouts.pollution_secs, 3);
        assert_eq!(config.timeouts.geocoding_secs, 10);
        assert_eq!(config.openweather_credentials().unwrap().len(), 2);
        assert_eq!(config.data_dir, Some(PathBuf::from("/var/lib/air")));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_OPENWEATHER_API_KEYS, "k1, k2,,k3"),
            (ENV_OPENAI_MODEL, "gpt-4o"),
            (ENV_DATA_DIR, "/tmp/granules"),
        ]);
        let mut config = MonitorConfig::default();
        config.apply_env_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.openweather_api_keys, ["k1", "k2", "k3"]);
        assert_eq!(config.openai_model, "gpt-4o");
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/granules")));
        assert!(config.openai_credentials().is_none());
        assert!(config.earthdata_credentials().is_none());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitor.toml");
        tokio::fs::write(&path, "satellite_search_days = 7\nclimate_row_cap = 25\n")
            .await
            .unwrap();

        let config = MonitorConfig::load(&path).await.unwrap();
        assert_eq!(config.satellite_search_days, 7);
        assert_eq!(config.climate_row_cap, 25);

        let missing = MonitorConfig::load(&dir.path().join("absent.toml")).await;
        assert!(matches!(missing, Err(ConfigError::Read(..))));

        tokio::fs::write(&path, "climate_row_cap = \"many\"").await.unwrap();
        assert!(matches!(
            MonitorConfig::load(&path).await,
            Err(ConfigError::Parse(..))
        ));
    }

    #[test]
    fn test_missing_openweather_keys() {
        assert!(matches!(
            MonitorConfig::default().openweather_credentials(),
            Err(ConfigError::MissingCredentials { .. })
        ));
    }
}
