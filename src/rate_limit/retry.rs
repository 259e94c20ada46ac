//! Retry handling for throttled (HTTP 429) responses.

use std::time::Duration;

/// Wait used when a 429 carries no usable `Retry-After`.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(10);

/// Parse Retry-After header value (seconds).
/// Returns duration to wait, or None if header is missing/invalid.
pub fn parse_retry_after(header_value: Option<&str>) -> Option<Duration> {
    let value = header_value?;
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// How the client reacts to 429 responses.
///
/// Every 429 is followed by a sleep of the server-suggested delay and a
/// reissue of the identical request. The delay does not grow between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt. `None` retries forever.
    pub max_retries: Option<u32>,
    /// Delay used when the server gives no usable hint.
    pub fallback_delay: Duration,
}

impl RetryPolicy {
    pub fn unbounded() -> Self {
        Self {
            max_retries: None,
            fallback_delay: DEFAULT_RETRY_AFTER,
        }
    }

    pub fn with_max_retries(mut self, max_retries: Option<u32>) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_fallback_delay(mut self, delay: Duration) -> Self {
        self.fallback_delay = delay;
        self
    }

    /// Delay to sleep for a 429 carrying this `Retry-After` value.
    pub fn delay_for(&self, retry_after: Option<&str>) -> Duration {
        parse_retry_after(retry_after).unwrap_or(self.fallback_delay)
    }

    /// Whether another retry is allowed after `retries_done` retries.
    pub fn allows_retry(&self, retries_done: u32) -> bool {
        self.max_retries.map_or(true, |max| retries_done < max)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unbounded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after(Some("5")), Some(Duration::from_secs(5)));
        assert_eq!(parse_retry_after(Some(" 120 ")), Some(Duration::from_secs(120)));
        assert_eq!(parse_retry_after(Some("soon")), None);
        assert_eq!(parse_retry_after(Some("-3")), None);
        assert_eq!(parse_retry_after(None), None);
    }

    #[test]
    fn test_fallback_delay_on_missing_or_invalid() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(None), DEFAULT_RETRY_AFTER);
        assert_eq!(
            policy.delay_for(Some("Wed, 21 Oct 2015 07:28:00 GMT")),
            DEFAULT_RETRY_AFTER
        );
        assert_eq!(policy.delay_for(Some("2")), Duration::from_secs(2));
    }

    #[test]
    fn test_retry_cap() {
        let unbounded = RetryPolicy::unbounded();
        assert!(unbounded.allows_retry(u32::MAX - 1));

        let capped = RetryPolicy::unbounded().with_max_retries(Some(2));
        assert!(capped.allows_retry(0));
        assert!(capped.allows_retry(1));
        assert!(!capped.allows_retry(2));

        let never = RetryPolicy::unbounded().with_max_retries(Some(0));
        assert!(!never.allows_retry(0));
    }
}
