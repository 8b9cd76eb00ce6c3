//! Process-wide spacing of outbound Entrez calls.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::trace;

/// Enforces a minimum interval between any two outbound API calls.
///
/// One instance is shared (via `Arc`) by every client in the process:
/// search, fetch, citation and gene-link calls all contend on the same
/// clock. The last-call timestamp lives behind a single mutex; the
/// sleep happens while the lock is held so two concurrent callers can
/// never both proceed under the same stale timestamp.
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(requests_per_second: u32) -> Self {
        let rps = requests_per_second.max(1);
        Self {
            min_interval: Duration::from_secs_f64(1.0 / rps as f64),
            last_call: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Suspend until the minimum interval since the last permitted call
    /// has elapsed, then stamp this call as the new reference point.
    pub async fn acquire(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                trace!(?wait, "rate limiter pausing");
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn sequential_calls_are_spaced() {
        let limiter = RateLimiter::new(50); // 20ms interval
        let start = Instant::now();
        for _ in 0..4 {
            limiter.acquire().await;
        }
        // 4 calls => at least 3 full intervals of wall time.
        assert!(start.elapsed() >= limiter.min_interval() * 3);
    }

    #[tokio::test]
    async fn concurrent_callers_share_the_clock() {
        let limiter = Arc::new(RateLimiter::new(50));
        let start = Instant::now();
        let tasks: Vec<_> = (0..3)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move { limiter.acquire().await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }
        assert!(start.elapsed() >= limiter.min_interval() * 2);
    }

    #[tokio::test]
    async fn first_call_does_not_wait() {
        let limiter = RateLimiter::new(1);
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
