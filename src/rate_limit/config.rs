//! Rate governor configuration and types.

use std::time::Duration;

/// Extra time slept past the end of an exhausted window.
pub const DEFAULT_SAFETY_MARGIN: Duration = Duration::from_secs(1);

/// Request budget for a fixed time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    /// Maximum requests allowed per window.
    pub budget: u32,
    /// Length of one window.
    pub window: Duration,
    /// Added on top of the remaining window time when the budget runs out.
    pub safety_margin: Duration,
}

impl WindowConfig {
    /// `budget` requests per `window`.
    pub fn per_window(budget: u32, window: Duration) -> Self {
        Self {
            budget,
            window,
            safety_margin: DEFAULT_SAFETY_MARGIN,
        }
    }

}

impl Default for WindowConfig {
    /// Skinport's published limit: 8 requests per 5 minutes.
    fn default() -> Self {
        Self::per_window(8, Duration::from_secs(5 * 60))
    }
}

/// Counters exposed for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GovernorStats {
    pub requests_in_window: u32,
    pub budget: u32,
    pub total_requests: u64,
    pub throttled_waits: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_window_uses_default_margin() {
        let config = WindowConfig::per_window(60, Duration::from_secs(60));
        assert_eq!(config.budget, 60);
        assert_eq!(config.window, Duration::from_secs(60));
        assert_eq!(config.safety_margin, DEFAULT_SAFETY_MARGIN);
    }

    #[test]
    fn test_zero_budget_is_kept_for_validation() {
        assert_eq!(WindowConfig::per_window(0, Duration::from_secs(1)).budget, 0);
    }
}
