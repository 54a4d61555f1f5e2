use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

/// Spaces successive calls by at least a fixed minimum interval.
///
/// A leaky-bucket-of-one: each `wait_turn` suspends until `min_interval`
/// has elapsed since the previous call, then records its own timestamp.
/// This throttles before a call is made and is independent of whether the
/// call later succeeds, fails, or is retried.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// Suspends until this caller is allowed to proceed.
    ///
    /// The lock is held across the sleep so concurrent callers queue up
    /// rather than racing for the same slot.
    pub async fn wait_turn(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn spaces_back_to_back_calls() {
        let limiter = RateLimiter::new(Duration::from_millis(50));
        let start = Instant::now();
        limiter.wait_turn().await;
        limiter.wait_turn().await;
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn idle_period_incurs_no_delay() {
        let limiter = RateLimiter::new(Duration::from_millis(20));
        limiter.wait_turn().await;
        sleep(Duration::from_millis(40)).await;
        let start = Instant::now();
        limiter.wait_turn().await;
        assert!(start.elapsed() < Duration::from_millis(10));
    }

    #[tokio::test]
    async fn first_call_is_immediate() {
        let limiter = RateLimiter::new(Duration::from_secs(5));
        let start = Instant::now();
        limiter.wait_turn().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
