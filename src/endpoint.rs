//! The two read-only marketplace endpoints and their resolved fetch profiles.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{FetchError, FetchResult};
use crate::rate_limit::WindowConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    /// `/items`: current listings with min/max/suggested prices.
    Items,
    /// `/sales/history`: aggregated sales over the last 24h/7d/30d/90d.
    SalesHistory,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Items => "items",
            Endpoint::SalesHistory => "sales/history",
        }
    }

    /// Whether Basic auth is attached when credentials are available.
    pub fn sends_auth(&self) -> bool {
        matches!(self, Endpoint::Items)
    }

    pub fn default_file_prefix(&self) -> &'static str {
        match self {
            Endpoint::Items => "skinport_items",
            Endpoint::SalesHistory => "all_sales_history",
        }
    }

    /// Per-attempt timeout applied when the config does not set one.
    pub fn default_timeout(&self) -> Option<Duration> {
        match self {
            Endpoint::Items => Some(Duration::from_secs(30)),
            Endpoint::SalesHistory => None,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Everything the driver needs to fetch one endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointProfile {
    pub endpoint: Endpoint,
    pub window: WindowConfig,
    pub timeout: Option<Duration>,
    pub output_dir: PathBuf,
    pub file_prefix: String,
    /// Items only; sent as `0`/`1`.
    pub tradable: Option<bool>,
    /// Sales history only; restricts the response to one item.
    pub market_hash_name: Option<String>,
}

impl EndpointProfile {
    /// Reject values that would break the request or the snapshot filename.
    pub fn validate(&self) -> FetchResult<()> {
        if self.file_prefix.is_empty() {
            return Err(FetchError::Config(format!(
                "file prefix for {} must not be empty",
                self.endpoint
            )));
        }
        if let Some(bad) = self
            .file_prefix
            .chars()
            .find(|c| matches!(c, '.' | ':' | '/' | '\\'))
        {
            return Err(FetchError::Config(format!(
                "file prefix {:?} for {} contains {:?}",
                self.file_prefix, self.endpoint, bad
            )));
        }
        if self.window.budget == 0 {
            return Err(FetchError::Config(format!(
                "request budget for {} must be at least 1",
                self.endpoint
            )));
        }
        if self.window.window.is_zero() {
            return Err(FetchError::Config(format!(
                "rate window for {} must be longer than zero",
                self.endpoint
            )));
        }
        Ok(())
    }
}
