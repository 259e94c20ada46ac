//! Fetch-and-persist driver.
//!
//! Builds the request for one endpoint, pushes it through the governed client,
//! parses the body and writes the snapshot.

use std::path::PathBuf;

use tracing::{debug, error, info, warn};

use crate::config::{SaveMode, Settings};
use crate::endpoint::{Endpoint, EndpointProfile};
use crate::error::FetchResult;
use crate::http_client::{Credentials, FetchRequest, HttpClient, ReqwestTransport, Transport};
use crate::rate_limit::WindowGovernor;
use crate::snapshot::{item_count, SnapshotWriter};

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSummary {
    pub endpoint: Endpoint,
    /// Records in the snapshot when its top level is an array.
    pub item_count: Option<usize>,
    /// Where the snapshot landed; `None` if a best-effort save failed.
    pub path: Option<PathBuf>,
    /// Attempts including 429 retries.
    pub attempts: u32,
}

/// Fetches one endpoint. Owns the governor for that endpoint.
pub struct Fetcher<T = ReqwestTransport> {
    client: HttpClient<T>,
    governor: WindowGovernor,
    profile: EndpointProfile,
    writer: SnapshotWriter,
    base_url: String,
    app_id: u32,
    currency: String,
    credentials: Option<Credentials>,
    save_mode: SaveMode,
}

impl Fetcher<ReqwestTransport> {
    pub fn new(settings: &Settings, endpoint: Endpoint) -> FetchResult<Self> {
        let client = HttpClient::new(settings.user_agent.as_deref())?;
        Self::with_client(settings, endpoint, client)
    }
}

impl<T: Transport> Fetcher<T> {
    pub fn with_transport(settings: &Settings, endpoint: Endpoint, transport: T) -> FetchResult<Self> {
        Self::with_client(settings, endpoint, HttpClient::with_transport(transport))
    }

    fn with_client(
        settings: &Settings,
        endpoint: Endpoint,
        client: HttpClient<T>,
    ) -> FetchResult<Self> {
        let profile = settings.profile(endpoint)?;
        let client = client.with_retry_policy(settings.retry_policy());

        if endpoint.sends_auth() && settings.credentials.is_none() {
            warn!(
                "No client credentials configured, requesting {} without authorization",
                endpoint
            );
        }

        Ok(Self {
            client,
            governor: WindowGovernor::new(profile.window),
            writer: SnapshotWriter::new(&profile.output_dir, &profile.file_prefix),
            profile,
            base_url: settings.base_url.clone(),
            app_id: settings.app_id,
            currency: settings.currency.clone(),
            credentials: settings.credentials.clone(),
            save_mode: settings.save_mode,
        })
    }

    pub fn governor(&self) -> &WindowGovernor {
        &self.governor
    }

    /// The one GET request this fetcher issues.
    pub fn build_request(&self) -> FetchRequest {
        let endpoint = self.profile.endpoint;
        let mut request = FetchRequest::new(&self.base_url, endpoint.path())
            .with_query("app_id", self.app_id)
            .with_query("currency", &self.currency)
            .with_header("Accept", "application/json")
            .with_header("Accept-Encoding", "br")
            .with_timeout(self.profile.timeout);

        if let Some(tradable) = self.profile.tradable {
            request = request.with_query("tradable", u8::from(tradable));
        }
        if let Some(name) = &self.profile.market_hash_name {
            request = request.with_query("market_hash_name", name);
        }
        if endpoint.sends_auth() {
            if let Some(credentials) = &self.credentials {
                request = request.with_header("Authorization", credentials.basic_auth_header());
            }
        }

        request
    }

    /// Fetch, parse and persist one snapshot.
    pub async fn run(&mut self) -> FetchResult<FetchSummary> {
        let request = self.build_request();
        info!("Fetching {}", request.url()?);

        let response = self.client.get(&mut self.governor, &request).await?;
        debug!("Rate governor: {:?}", self.governor.stats());

        let data = match response.json() {
            Ok(data) => data,
            Err(e) => {
                error!(
                    "Response body ({}) is not valid JSON:\n{}",
                    response.content_type().unwrap_or("no content type"),
                    response.body
                );
                return Err(e);
            }
        };

        let count = item_count(&data);
        match count {
            Some(n) => info!("Received {} items from {}", n, self.profile.endpoint),
            None => info!(
                "Received non-array JSON document from {}",
                self.profile.endpoint
            ),
        }

        let path = match self.writer.write(&data) {
            Ok(path) => Some(path),
            Err(e) if self.save_mode == SaveMode::BestEffort => {
                warn!("Snapshot not saved: {}", e);
                None
            }
            Err(e) => return Err(e),
        };

        Ok(FetchSummary {
            endpoint: self.profile.endpoint,
            item_count: count,
            path,
            attempts: response.attempts,
        })
    }
}
