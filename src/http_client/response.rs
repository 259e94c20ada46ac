//! HTTP response wrapper.

use std::collections::HashMap;

use reqwest::StatusCode;
use serde_json::Value;

use crate::error::{FetchError, FetchResult};

/// Fully buffered response.
///
/// The body is kept as text so it can be logged verbatim when it fails to parse.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    /// Header names are lowercase.
    pub headers: HashMap<String, String>,
    pub body: String,
    /// Attempts it took to get this response, 429 retries included.
    pub attempts: u32,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
            attempts: 1,
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Check if the response is successful.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Check if the server asked us to slow down.
    pub fn is_rate_limited(&self) -> bool {
        self.status == StatusCode::TOO_MANY_REQUESTS
    }

    /// Get the Retry-After header.
    pub fn retry_after(&self) -> Option<&str> {
        self.headers.get("retry-after").map(|s| s.as_str())
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(|s| s.as_str())
    }

    /// Parse the body as JSON, keeping the raw text on failure.
    pub fn json(&self) -> FetchResult<Value> {
        serde_json::from_str(&self.body).map_err(|source| FetchError::Parse {
            source,
            body: self.body.clone(),
        })
    }
}
