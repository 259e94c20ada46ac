//! Fixed-window request governor.
//!
//! Counts requests issued inside the current window and suspends the caller
//! once the budget is spent. The window resets either when it has fully
//! elapsed or right after a throttled wait.
//!
//! The reset check and the budget check run independently on every call, so a
//! burst landing exactly on a window boundary may exceed the budget by one
//! in-flight request before the next check catches it.

mod config;
mod retry;

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

pub use config::{GovernorStats, WindowConfig, DEFAULT_SAFETY_MARGIN};
pub use retry::{parse_retry_after, RetryPolicy, DEFAULT_RETRY_AFTER};

/// Mutable window counters.
#[derive(Debug, Clone, Default)]
struct WindowState {
    window_start: Option<Instant>,
    requests_in_window: u32,
}

/// Request governor for a single endpoint.
///
/// Owned by whoever issues the requests and passed by `&mut`; each endpoint
/// profile gets its own instance.
#[derive(Debug, Clone)]
pub struct WindowGovernor {
    config: WindowConfig,
    state: WindowState,
    total_requests: u64,
    throttled_waits: u64,
}

impl WindowGovernor {
    pub fn new(config: WindowConfig) -> Self {
        Self {
            config,
            state: WindowState::default(),
            total_requests: 0,
            throttled_waits: 0,
        }
    }

    /// Wait until a request slot is free, then claim it.
    ///
    /// Returns how long the caller was suspended.
    pub async fn acquire(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = self
            .state
            .window_start
            .map(|start| now.saturating_duration_since(start));

        let elapsed = match elapsed {
            Some(elapsed) if elapsed <= self.config.window => elapsed,
            _ => {
                self.state.requests_in_window = 0;
                self.state.window_start = Some(now);
                Duration::ZERO
            }
        };

        let mut slept = Duration::ZERO;
        if self.state.requests_in_window >= self.config.budget {
            let wait = self.config.window.saturating_sub(elapsed);
            info!(
                "Request budget of {} per {:?} reached, waiting {}s",
                self.config.budget,
                self.config.window,
                wait.as_secs_f64().ceil()
            );

            let start = Instant::now();
            tokio::time::sleep(wait + self.config.safety_margin).await;
            slept = start.elapsed();

            self.state.requests_in_window = 0;
            self.state.window_start = Some(Instant::now());
            self.throttled_waits += 1;
        }

        self.state.requests_in_window += 1;
        self.total_requests += 1;
        debug!(
            "Request #{}/{}, {} left in window",
            self.state.requests_in_window,
            self.config.budget,
            self.remaining()
        );

        slept
    }

    /// Budget left in the current window.
    ///
    /// Does not account for a window that has expired but not yet been reset.
    pub fn remaining(&self) -> u32 {
        self.config
            .budget
            .saturating_sub(self.state.requests_in_window)
    }

    pub fn stats(&self) -> GovernorStats {
        GovernorStats {
            requests_in_window: self.state.requests_in_window,
            budget: self.config.budget,
            total_requests: self.total_requests,
            throttled_waits: self.throttled_waits,
        }
    }
}

impl Default for WindowGovernor {
    fn default() -> Self {
        Self::new(WindowConfig::default())
    }
}
