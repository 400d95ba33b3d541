//! Politeness delay between outbound document downloads

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

/// Serializes callers and spaces them at least `interval` apart.
///
/// One instance is shared by every document fetch against the same host.
#[derive(Debug)]
pub struct RateLimiter {
    last_release: Mutex<Option<Instant>>,
    interval: Duration,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            last_release: Mutex::new(None),
            interval,
        }
    }

    /// Wait until `interval` has passed since the previous caller was released.
    /// The first caller waits a full interval.
    pub async fn throttle(&self) {
        let mut last = self.last_release.lock().await;
        let now = Instant::now();
        let ready_at = match *last {
            Some(previous) => (previous + self.interval).max(now),
            None => now + self.interval,
        };

        if ready_at > now {
            debug!("Throttling for {:?}", ready_at - now);
            sleep_until(ready_at).await;
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_sequential_calls_are_spaced() {
        let limiter = RateLimiter::new(Duration::from_millis(125));
        let start = Instant::now();

        for _ in 0..4 {
            limiter.throttle().await;
        }

        assert!(start.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_callers_are_not_delayed_further() {
        let limiter = RateLimiter::new(Duration::from_millis(100));
        limiter.throttle().await;

        tokio::time::sleep(Duration::from_millis(300)).await;
        let before = Instant::now();
        limiter.throttle().await;

        assert_eq!(before.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_the_limit() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(100)));
        let start = Instant::now();

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { limiter.throttle().await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(start.elapsed() >= Duration::from_millis(300));
    }
}
