//! Configuration management for marketsnap.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! CLI flags. Credentials never come from the file; they are read from the
//! environment (optionally via `.env`) or passed on the command line.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::endpoint::{Endpoint, EndpointProfile};
use crate::error::FetchResult;
use crate::http_client::Credentials;
use crate::rate_limit::{RetryPolicy, WindowConfig};

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "marketsnap.toml";

pub const DEFAULT_BASE_URL: &str = "https://api.skinport.com/v1";

/// Counter-Strike 2.
pub const DEFAULT_APP_ID: u32 = 730;

pub const DEFAULT_CURRENCY: &str = "EUR";

/// What happens when the snapshot cannot be written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum SaveMode {
    /// Fail the run.
    #[default]
    Strict,
    /// Log the failure and still exit successfully.
    BestEffort,
}

/// Per-endpoint overrides. Unset fields fall back to the endpoint defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointSettings {
    /// Requests allowed per window.
    pub budget: Option<u32>,
    /// Window length in seconds.
    pub window_secs: Option<u64>,
    /// Per-attempt timeout in seconds; 0 disables it.
    pub timeout_secs: Option<u64>,
    /// Snapshot directory for this endpoint; defaults to the global one.
    pub output_dir: Option<PathBuf>,
    pub file_prefix: Option<String>,
    pub tradable: Option<bool>,
    pub market_hash_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub base_url: String,
    /// Custom user agent; the default identifies marketsnap.
    pub user_agent: Option<String>,
    pub output_dir: PathBuf,
    pub app_id: u32,
    pub currency: String,
    pub save_mode: SaveMode,
    /// 429 retries before giving up; unset retries forever.
    pub max_retries: Option<u32>,
    /// Wait used when a 429 has no usable Retry-After.
    pub retry_after_fallback_secs: u64,
    pub items: EndpointSettings,
    pub history: EndpointSettings,
    #[serde(skip)]
    pub credentials: Option<Credentials>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: None,
            output_dir: PathBuf::from("data"),
            app_id: DEFAULT_APP_ID,
            currency: DEFAULT_CURRENCY.to_string(),
            save_mode: SaveMode::default(),
            max_retries: None,
            retry_after_fallback_secs: 10,
            items: EndpointSettings::default(),
            history: EndpointSettings::default(),
            credentials: None,
        }
    }
}

impl Settings {
    /// Load settings from `path`, or from `marketsnap.toml` in the working
    /// directory if it exists, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn endpoint_settings(&self, endpoint: Endpoint) -> &EndpointSettings {
        match endpoint {
            Endpoint::Items => &self.items,
            Endpoint::SalesHistory => &self.history,
        }
    }

    pub fn endpoint_settings_mut(&mut self, endpoint: Endpoint) -> &mut EndpointSettings {
        match endpoint {
            Endpoint::Items => &mut self.items,
            Endpoint::SalesHistory => &mut self.history,
        }
    }

    /// Resolve the effective profile for one endpoint.
    pub fn profile(&self, endpoint: Endpoint) -> FetchResult<EndpointProfile> {
        let overrides = self.endpoint_settings(endpoint);
        let defaults = WindowConfig::default();

        let window = WindowConfig::per_window(
            overrides.budget.unwrap_or(defaults.budget),
            overrides
                .window_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.window),
        );

        let timeout = match overrides.timeout_secs {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => endpoint.default_timeout(),
        };

        let profile = EndpointProfile {
            endpoint,
            window,
            timeout,
            output_dir: overrides
                .output_dir
                .clone()
                .unwrap_or_else(|| self.output_dir.clone()),
            file_prefix: overrides
                .file_prefix
                .clone()
                .unwrap_or_else(|| endpoint.default_file_prefix().to_string()),
            tradable: match endpoint {
                Endpoint::Items => Some(overrides.tradable.unwrap_or(false)),
                Endpoint::SalesHistory => None,
            },
            market_hash_name: match endpoint {
                Endpoint::Items => None,
                Endpoint::SalesHistory => overrides
                    .market_hash_name
                    .clone()
                    .filter(|name| !name.is_empty()),
            },
        };
        profile.validate()?;
        Ok(profile)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::unbounded()
            .with_max_retries(self.max_retries)
            .with_fallback_delay(Duration::from_secs(self.retry_after_fallback_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        let items = settings.profile(Endpoint::Items).unwrap();
        assert_eq!(items.window, WindowConfig::per_window(8, Duration::from_secs(300)));
        assert_eq!(items.timeout, Some(Duration::from_secs(30)));
        assert_eq!(items.tradable, Some(false));
        assert_eq!(items.file_prefix, "skinport_items");

        let history = settings.profile(Endpoint::SalesHistory).unwrap();
        assert_eq!(history.timeout, None);
        assert_eq!(history.tradable, None);
        assert_eq!(history.file_prefix, "all_sales_history");
        assert_eq!(history.output_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_toml_overrides() {
        let settings = Settings::from_toml(
            r#"
            currency = "USD"
            output_dir = "/srv/skins"
            max_retries = 5

            [items]
            budget = 60
            window_secs = 60
            timeout_secs = 0
            output_dir = "/srv/skins/items"

            [history]
            market_hash_name = "AWP | Asiimov (Field-Tested)"
            "#,
        )
        .unwrap();

        assert_eq!(settings.currency, "USD");
        assert_eq!(settings.app_id, DEFAULT_APP_ID);
        assert_eq!(settings.retry_policy().max_retries, Some(5));

        let items = settings.profile(Endpoint::Items).unwrap();
        assert_eq!(items.window, WindowConfig::per_window(60, Duration::from_secs(60)));
        assert_eq!(items.timeout, None);
        assert_eq!(items.output_dir, PathBuf::from("/srv/skins/items"));

        let history = settings.profile(Endpoint::SalesHistory).unwrap();
        assert_eq!(history.output_dir, PathBuf::from("/srv/skins"));
        assert_eq!(
            history.market_hash_name.as_deref(),
            Some("AWP | Asiimov (Field-Tested)")
        );
    }

    #[test]
    fn test_save_mode_parses() {
        let settings = Settings::from_toml("save_mode = \"best_effort\"").unwrap();
        assert_eq!(settings.save_mode, SaveMode::BestEffort);
    }

    #[test]
    fn test_unknown_save_mode_rejected() {
        assert!(Settings::from_toml("save_mode = \"sometimes\"").is_err());
    }

    #[test]
    fn test_bad_prefix_fails_profile() {
        let mut settings = Settings::default();
        settings.items.file_prefix = Some("items.json".to_string());
        assert!(settings.profile(Endpoint::Items).is_err());
    }

    #[test]
    fn test_zero_budget_fails_profile() {
        let settings = Settings::from_toml("[items]\nbudget = 0\n").unwrap();
        assert!(matches!(
            settings.profile(Endpoint::Items),
            Err(crate::error::FetchError::Config(_))
        ));
        assert!(settings.profile(Endpoint::SalesHistory).is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("marketsnap.toml");
        fs::write(&path, "app_id = 570\n").unwrap();

        let settings = Settings::load(Some(path.as_path())).unwrap();
        assert_eq!(settings.app_id, 570);
        assert!(Settings::load(Some(dir.path().join("missing.toml").as_path())).is_err());
    }
}
