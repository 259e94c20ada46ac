//! HTTP client with window governing and 429 retry.

mod auth;
mod request;
mod response;
mod user_agent;

pub use auth::Credentials;
pub use request::FetchRequest;
pub use response::HttpResponse;
pub use user_agent::{resolve_user_agent, USER_AGENT};

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult};
use crate::rate_limit::{RetryPolicy, WindowGovernor};

/// Sends a single request attempt.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &FetchRequest) -> FetchResult<HttpResponse>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: &FetchRequest) -> FetchResult<HttpResponse> {
        self.as_ref().send(request).await
    }
}

/// Network transport backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with brotli and gzip decoding enabled.
    pub fn new(user_agent_config: Option<&str>) -> FetchResult<Self> {
        let user_agent = resolve_user_agent(user_agent_config);
        let client = Client::builder()
            .user_agent(&user_agent)
            .gzip(true)
            .brotli(true)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &FetchRequest) -> FetchResult<HttpResponse> {
        let url = request.url()?;
        let response = self
            .client
            .get(url)
            .headers(request.header_map()?)
            .send()
            .await?;

        let status = response.status();
        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(name.to_string(), v.to_string());
            }
        }
        let body = response.text().await?;

        Ok(HttpResponse {
            status,
            headers,
            body,
            attempts: 1,
        })
    }
}

/// Client that runs every attempt through a [`WindowGovernor`].
pub struct HttpClient<T = ReqwestTransport> {
    transport: T,
    retry: RetryPolicy,
}

impl HttpClient<ReqwestTransport> {
    /// Create a client on top of the reqwest transport.
    pub fn new(user_agent_config: Option<&str>) -> FetchResult<Self> {
        Ok(Self::with_transport(ReqwestTransport::new(user_agent_config)?))
    }
}

impl<T: Transport> HttpClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Issue `request`, waiting on the governor before every attempt.
    ///
    /// 429 responses are retried after their `Retry-After` delay. Any other
    /// non-2xx status and any timeout end the call without a retry.
    pub async fn get(
        &self,
        governor: &mut WindowGovernor,
        request: &FetchRequest,
    ) -> FetchResult<HttpResponse> {
        let mut retries = 0u32;

        loop {
            governor.acquire().await;
            let mut response = self.send_once(request).await?;

            if response.is_rate_limited() {
                if !self.retry.allows_retry(retries) {
                    return Err(FetchError::RateLimitExhausted {
                        attempts: retries + 1,
                    });
                }

                let delay = self.retry.delay_for(response.retry_after());
                warn!(
                    "429 Too Many Requests from {}, retrying in {}s",
                    request.path,
                    delay.as_secs()
                );
                tokio::time::sleep(delay).await;
                retries += 1;
                continue;
            }

            if !response.is_success() {
                return Err(FetchError::Http {
                    status: response.status,
                    body: response.body,
                });
            }

            debug!(
                "GET {} -> {} after {} attempt(s)",
                request.path,
                response.status,
                retries + 1
            );
            response.attempts = retries + 1;
            return Ok(response);
        }
    }

    async fn send_once(&self, request: &FetchRequest) -> FetchResult<HttpResponse> {
        match request.timeout {
            Some(limit) => tokio::time::timeout(limit, self.transport.send(request))
                .await
                .map_err(|_| FetchError::Timeout(limit))?,
            None => self.transport.send(request).await,
        }
    }
}
