//! CLI parser and command dispatch.
//!
//! This is the only place that turns fetch failures into console diagnostics
//! and process exit codes.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use tracing::error;

use crate::config::{SaveMode, Settings};
use crate::endpoint::Endpoint;
use crate::error::FetchError;
use crate::fetcher::{FetchSummary, Fetcher};
use crate::http_client::Credentials;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;

/// Longest slice of an error response body shown on the console.
const MAX_BODY_PREVIEW: usize = 500;

#[derive(Parser, Debug)]
#[command(name = "marketsnap")]
#[command(about = "Save rate-limited Skinport API snapshots as JSON files")]
#[command(version)]
pub struct Cli {
    /// Config file path (defaults to ./marketsnap.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory snapshots are written to
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// Currency for prices (EUR, USD, ...)
    #[arg(long, global = true)]
    currency: Option<String>,

    /// Steam app id (730 = Counter-Strike 2)
    #[arg(long, global = true)]
    app_id: Option<u32>,

    /// Give up after this many 429 retries (default: retry forever)
    #[arg(long, global = true)]
    max_retries: Option<u32>,

    /// What to do when the snapshot cannot be written
    #[arg(long, global = true, value_enum)]
    save_mode: Option<SaveMode>,

    /// Skinport API client id
    #[arg(long, global = true, env = "SKINPORT_CLIENT_ID")]
    client_id: Option<String>,

    /// Skinport API client secret
    #[arg(long, global = true, env = "SKINPORT_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Snapshot current item listings (/items)
    Items {
        /// Only list tradable items
        #[arg(long)]
        tradable: bool,
        /// Per-request timeout in seconds (0 disables)
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Snapshot aggregated sales history (/sales/history)
    History {
        /// Restrict to one item, e.g. "AK-47 | Redline (Field-Tested)"
        #[arg(long)]
        market_hash_name: Option<String>,
        /// Per-request timeout in seconds (0 disables)
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Print the effective configuration
    Config,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

impl Cli {
    /// Settings with CLI flags layered over the config file.
    fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = Settings::load(self.config.as_deref())?;

        if let Some(dir) = &self.output_dir {
            settings.output_dir = dir.clone();
        }
        if let Some(currency) = &self.currency {
            settings.currency = currency.clone();
        }
        if let Some(app_id) = self.app_id {
            settings.app_id = app_id;
        }
        if self.max_retries.is_some() {
            settings.max_retries = self.max_retries;
        }
        if let Some(mode) = self.save_mode {
            settings.save_mode = mode;
        }
        settings.credentials =
            Credentials::from_parts(self.client_id.clone(), self.client_secret.clone());

        match &self.command {
            Commands::Items { tradable, timeout } => {
                let items = settings.endpoint_settings_mut(Endpoint::Items);
                if *tradable {
                    items.tradable = Some(true);
                }
                if timeout.is_some() {
                    items.timeout_secs = *timeout;
                }
            }
            Commands::History {
                market_hash_name,
                timeout,
            } => {
                let history = settings.endpoint_settings_mut(Endpoint::SalesHistory);
                if market_hash_name.is_some() {
                    history.market_hash_name = market_hash_name.clone();
                }
                if timeout.is_some() {
                    history.timeout_secs = *timeout;
                }
            }
            Commands::Config => {}
        }

        Ok(settings)
    }
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = cli.settings()?;

    match cli.command {
        Commands::Items { .. } => cmd_fetch(&settings, Endpoint::Items).await,
        Commands::History { .. } => cmd_fetch(&settings, Endpoint::SalesHistory).await,
        Commands::Config => cmd_config(&settings),
    }
}

async fn cmd_fetch(settings: &Settings, endpoint: Endpoint) -> anyhow::Result<()> {
    let mut fetcher = Fetcher::new(settings, endpoint)?;
    let summary = fetcher.run().await?;
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &FetchSummary) {
    let count = summary
        .item_count
        .map(|n| format!("{} items", n))
        .unwrap_or_else(|| "1 document".to_string());

    match &summary.path {
        Some(path) => println!(
            "{} Saved {} from /{} to {}",
            style("✓").green(),
            count,
            summary.endpoint,
            path.display()
        ),
        None => println!(
            "{} Fetched {} from /{} but the snapshot was not saved",
            style("!").yellow(),
            count,
            summary.endpoint
        ),
    }
}

fn cmd_config(settings: &Settings) -> anyhow::Result<()> {
    print!("{}", render_config(settings)?);
    Ok(())
}

/// Effective settings as TOML. The client secret is never included.
fn render_config(settings: &Settings) -> anyhow::Result<String> {
    let mut out = toml::to_string_pretty(settings)?;
    match &settings.credentials {
        Some(credentials) => out.push_str(&format!(
            "\n# credentials: client id {} (secret hidden)\n",
            credentials.client_id
        )),
        None => out.push_str("\n# credentials: not configured\n"),
    }
    Ok(out)
}

/// Log and print a failed run.
pub fn report_error(err: &anyhow::Error) {
    error!("{:#}", err);
    eprintln!("{}", error_message(err));
}

/// Console diagnostic for a failed run, with distinct wording for timeouts
/// and unparsable bodies.
fn error_message(err: &anyhow::Error) -> String {
    let cross = style("✗").red();
    match err.downcast_ref::<FetchError>() {
        Some(fetch_err) if fetch_err.is_timeout() => {
            format!("{} Request timed out: {}", cross, fetch_err)
        }
        Some(FetchError::Parse { .. }) => {
            format!("{} Response was not valid JSON, no snapshot written", cross)
        }
        Some(fetch_err) => match fetch_err.body().map(str::trim) {
            Some(body) if !body.is_empty() => {
                let preview: String = body.chars().take(MAX_BODY_PREVIEW).collect();
                format!("{} {}\n  {}", cross, fetch_err, preview)
            }
            _ => format!("{} {}", cross, fetch_err),
        },
        None => format!("{} {:#}", cross, err),
    }
}

/// Process exit code for a finished run.
pub fn exit_code(result: &anyhow::Result<()>) -> u8 {
    match result {
        Ok(()) => EXIT_SUCCESS,
        Err(_) => EXIT_FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("marketsnap").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_item_flags_override_settings() {
        let tmp = tempfile::tempdir().unwrap();
        let config = tmp.path().join("marketsnap.toml");
        std::fs::write(&config, "currency = \"USD\"\n[items]\nbudget = 60\nwindow_secs = 60\n")
            .unwrap();

        let cli = parse(&[
            "items",
            "--tradable",
            "--timeout",
            "0",
            "--config",
            config.to_str().unwrap(),
            "--currency",
            "PLN",
            "--client-id",
            "id",
            "--client-secret",
            "secret",
        ]);
        let settings = cli.settings().unwrap();

        assert_eq!(settings.currency, "PLN");
        let profile = settings.profile(Endpoint::Items).unwrap();
        assert_eq!(profile.tradable, Some(true));
        assert_eq!(profile.timeout, None);
        assert_eq!(profile.window.window, Duration::from_secs(60));
        assert!(settings.credentials.is_some());
    }

    #[test]
    fn test_history_flags() {
        let cli = parse(&[
            "history",
            "--market-hash-name",
            "Glove Case",
            "--config",
            "/nonexistent/marketsnap.toml",
        ]);
        assert!(cli.settings().is_err());

        let tmp = tempfile::tempdir().unwrap();
        let config = tmp.path().join("empty.toml");
        std::fs::write(&config, "").unwrap();
        let cli = parse(&[
            "history",
            "--market-hash-name",
            "Glove Case",
            "--max-retries",
            "3",
            "--config",
            config.to_str().unwrap(),
        ]);
        let settings = cli.settings().unwrap();
        assert_eq!(settings.max_retries, Some(3));
        let profile = settings.profile(Endpoint::SalesHistory).unwrap();
        assert_eq!(profile.market_hash_name.as_deref(), Some("Glove Case"));
    }

    #[test]
    fn test_save_mode_flag_matches_config_spelling() {
        let tmp = tempfile::tempdir().unwrap();
        let config = tmp.path().join("empty.toml");
        std::fs::write(&config, "").unwrap();

        let cli = parse(&[
            "items",
            "--save-mode",
            "best_effort",
            "--config",
            config.to_str().unwrap(),
        ]);
        assert_eq!(cli.settings().unwrap().save_mode, SaveMode::BestEffort);

        let cli = parse(&["items", "--save-mode", "strict"]);
        assert_eq!(cli.save_mode, Some(SaveMode::Strict));
        assert!(Cli::try_parse_from(["marketsnap", "items", "--save-mode", "best-effort"]).is_err());
    }

    #[test]
    fn test_config_output_hides_secret() {
        let mut settings = Settings::default();
        settings.credentials = Some(Credentials::new("my-client", "hunter2"));

        let out = render_config(&settings).unwrap();
        assert!(out.contains("currency = \"EUR\""));
        assert!(out.contains("save_mode = \"strict\""));
        assert!(out.contains("client id my-client (secret hidden)"));
        assert!(!out.contains("hunter2"));

        let out = render_config(&Settings::default()).unwrap();
        assert!(out.contains("# credentials: not configured"));
    }

    #[test]
    fn test_error_messages() {
        let timeout: anyhow::Error = FetchError::Timeout(Duration::from_secs(30)).into();
        assert!(error_message(&timeout).contains("Request timed out"));

        let parse: anyhow::Error = FetchError::Parse {
            source: serde_json::from_str::<serde_json::Value>("<html>").unwrap_err(),
            body: "<html>".to_string(),
        }
        .into();
        let message = error_message(&parse);
        assert!(message.contains("not valid JSON"));
        assert!(!message.contains("timed out"));

        let http: anyhow::Error = FetchError::Http {
            status: reqwest::StatusCode::FORBIDDEN,
            body: "{\"errors\":[{\"id\":\"invalid_client\"}]}".to_string(),
        }
        .into();
        let message = error_message(&http);
        assert!(message.contains("403 Forbidden"));
        assert!(message.contains("invalid_client"));

        let other = anyhow::anyhow!("Failed to read config file");
        assert!(error_message(&other).contains("Failed to read config file"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&Ok(())), EXIT_SUCCESS);
        let failed: anyhow::Result<()> = Err(FetchError::Timeout(Duration::from_secs(30)).into());
        assert_eq!(exit_code(&failed), EXIT_FAILURE);
    }
}
