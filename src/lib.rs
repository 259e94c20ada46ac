//! marketsnap - save rate-limited marketplace API snapshots to disk.
//!
//! The interesting part is [`rate_limit::WindowGovernor`], a fixed-window
//! request budget that every outbound request waits on, combined with the
//! 429 retry loop in [`http_client::HttpClient`]. [`fetcher::Fetcher`] ties
//! them to one endpoint and writes the result via [`snapshot::SnapshotWriter`].

pub mod cli;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod fetcher;
pub mod http_client;
pub mod rate_limit;
pub mod snapshot;

pub use config::Settings;
pub use endpoint::Endpoint;
pub use error::{FetchError, FetchResult};
pub use fetcher::{FetchSummary, Fetcher};
