use std::time::Duration;

/// Configuration for retry and backoff behavior.
///
/// Constructed once per call site, usually by layering overrides on top of
/// [`RetryPolicy::default`], and dropped when the call completes.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Total number of attempts including the first one
    pub max_attempts: u32,
    /// Initial backoff delay
    pub base_delay: Duration,
    /// Upper bound for any single backoff delay
    pub max_delay: Duration,
    /// Growth factor applied per attempt
    pub backoff_multiplier: f64,
    /// HTTP status codes treated as transient
    pub retryable_status_codes: Vec<u16>,
    /// Message substrings identifying transient network failures
    pub retryable_error_patterns: Vec<String>,
}

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BASE_DELAY_MS: u64 = 500;
const DEFAULT_MAX_DELAY_MS: u64 = 10_000;
const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

const DEFAULT_RETRYABLE_STATUS_CODES: &[u16] = &[408, 429, 500, 502, 503, 504];

const DEFAULT_RETRYABLE_ERROR_PATTERNS: &[&str] = &[
    "connection reset",
    "connection refused",
    "connection closed",
    "broken pipe",
    "dns error",
    "failed to lookup",
    "timed out",
    "timeout",
    "temporarily unavailable",
    "socket",
];

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            retryable_status_codes: DEFAULT_RETRYABLE_STATUS_CODES.to_vec(),
            retryable_error_patterns: DEFAULT_RETRYABLE_ERROR_PATTERNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl RetryPolicy {
    /// Overrides the total attempt count. Clamped to at least 1; a policy
    /// with a single attempt never retries regardless of error type.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Whether the given HTTP status is considered transient.
    pub fn status_is_retryable(&self, status: u16) -> bool {
        self.retryable_status_codes.contains(&status)
    }

    /// Whether the given message matches a transient-network pattern.
    pub fn message_is_retryable(&self, message: &str) -> bool {
        let lower = message.to_lowercase();
        self.retryable_error_patterns
            .iter()
            .any(|pattern| lower.contains(pattern))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_attempts_clamps_to_one() {
        let policy = RetryPolicy::default().with_max_attempts(0);
        assert_eq!(policy.max_attempts, 1);
    }

    #[test]
    fn default_status_codes_cover_rate_limit_and_server_errors() {
        let policy = RetryPolicy::default();
        assert!(policy.status_is_retryable(429));
        assert!(policy.status_is_retryable(503));
        assert!(!policy.status_is_retryable(422));
    }

    #[test]
    fn message_matching_is_case_insensitive() {
        let policy = RetryPolicy::default();
        assert!(policy.message_is_retryable("Connection Reset by peer"));
        assert!(!policy.message_is_retryable("handle already exists"));
    }
}
