use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;

use crate::error::SyncError;

use super::classify::{classify, ErrorClass};
use super::policy::RetryPolicy;

/// Fraction of the computed delay added as uniform random jitter, to avoid
/// synchronized retry bursts across independent callers.
const JITTER_FRACTION: f64 = 0.1;

const LOGGED_ERROR_MAX_LEN: usize = 200;

/// Executes `op` with bounded retry and exponential backoff.
///
/// Permanent and unclassified failures propagate immediately; transient
/// failures are retried up to `policy.max_attempts` total attempts. The
/// final error is re-thrown unchanged so the caller can render a useful
/// diagnostic. No delay is incurred after the last failed attempt.
pub async fn execute<F, Fut, T>(mut op: F, policy: &RetryPolicy) -> Result<T, SyncError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SyncError>>,
{
    let mut attempt = 1u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= policy.max_attempts
                    || classify(&err, policy) != ErrorClass::Transient
                {
                    return Err(err);
                }
                let delay = backoff_delay(policy, attempt);
                log::warn!(
                    "attempt {attempt}/{} failed, retrying in {delay:?}: {}",
                    policy.max_attempts,
                    truncated(&err.to_string()),
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Delay before the attempt following `attempt` (1-based), capped by
/// `policy.max_delay`.
pub(super) fn backoff_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(32) as i32;
    let growth = policy.backoff_multiplier.powi(exponent);
    let jitter = 1.0 + rand::thread_rng().gen_range(0.0..JITTER_FRACTION);
    let raw = policy.base_delay.as_secs_f64() * growth * jitter;
    Duration::from_secs_f64(raw).min(policy.max_delay)
}

fn truncated(message: &str) -> String {
    if message.len() <= LOGGED_ERROR_MAX_LEN {
        return message.to_string();
    }
    let mut end = LOGGED_ERROR_MAX_LEN;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &message[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_attempts(max_attempts)
            .with_base_delay(Duration::from_millis(1))
            .with_max_delay(Duration::from_millis(5))
    }

    fn transient() -> SyncError {
        SyncError::Http {
            status: 503,
            message: "service unavailable".into(),
        }
    }

    #[tokio::test]
    async fn returns_success_after_transient_failures() {
        let calls = Cell::new(0u32);
        let result = execute(
            || {
                let n = calls.get() + 1;
                calls.set(n);
                async move {
                    if n < 3 {
                        Err(transient())
                    } else {
                        Ok(n)
                    }
                }
            },
            &fast_policy(5),
        )
        .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn exhausts_attempts_and_rethrows_final_error() {
        let calls = Cell::new(0u32);
        let result: Result<(), _> = execute(
            || {
                calls.set(calls.get() + 1);
                async { Err(transient()) }
            },
            &fast_policy(4),
        )
        .await;
        assert_eq!(calls.get(), 4);
        match result {
            Err(SyncError::Http { status: 503, .. }) => {}
            other => panic!("expected final 503 to propagate, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn permanent_error_is_not_retried() {
        let calls = Cell::new(0u32);
        let result: Result<(), _> = execute(
            || {
                calls.set(calls.get() + 1);
                async { Err(SyncError::Validation("handle already exists".into())) }
            },
            &fast_policy(10),
        )
        .await;
        assert_eq!(calls.get(), 1);
        assert!(matches!(result, Err(SyncError::Validation(_))));
    }

    #[tokio::test]
    async fn unclassified_error_is_not_retried() {
        let calls = Cell::new(0u32);
        let result: Result<(), _> = execute(
            || {
                calls.set(calls.get() + 1);
                async { Err(SyncError::Generic("something odd".into())) }
            },
            &fast_policy(10),
        )
        .await;
        assert_eq!(calls.get(), 1);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn single_attempt_policy_never_retries() {
        let calls = Cell::new(0u32);
        let result: Result<(), _> = execute(
            || {
                calls.set(calls.get() + 1);
                async { Err(transient()) }
            },
            &fast_policy(1),
        )
        .await;
        assert_eq!(calls.get(), 1);
        assert!(result.is_err());
    }

    #[test]
    fn backoff_is_monotone_and_capped() {
        let policy = RetryPolicy::default()
            .with_base_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_millis(2_000))
            .with_backoff_multiplier(2.0);
        let mut previous = Duration::ZERO;
        for attempt in 1..=10 {
            let delay = backoff_delay(&policy, attempt);
            assert!(delay >= previous, "delay shrank at attempt {attempt}");
            assert!(delay <= policy.max_delay);
            previous = delay;
        }
        assert_eq!(backoff_delay(&policy, 10), policy.max_delay);
    }

    #[test]
    fn truncated_preserves_short_messages() {
        assert_eq!(truncated("short"), "short");
        let long = "x".repeat(500);
        assert_eq!(truncated(&long).len(), LOGGED_ERROR_MAX_LEN + 3);
    }
}
