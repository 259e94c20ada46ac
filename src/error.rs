//! Error types for snapshot fetching.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/// Result type for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;

/// Errors that can end a fetch run.
///
/// HTTP 429 never appears here directly: the retry loop absorbs it and only
/// reports `RateLimitExhausted` when a retry cap was configured.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: status {status}")]
    Http { status: StatusCode, body: String },
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Failed to parse response body as JSON: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
        body: String,
    },
    #[error("Failed to write snapshot to {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Still rate limited after {attempts} attempts")]
    RateLimitExhausted { attempts: u32 },
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl FetchError {
    /// Whether this failure came from the per-request timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            FetchError::Timeout(_) => true,
            FetchError::Transport(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Raw response body attached to the error, if any.
    pub fn body(&self) -> Option<&str> {
        match self {
            FetchError::Http { body, .. } | FetchError::Parse { body, .. } => Some(body),
            _ => None,
        }
    }
}
