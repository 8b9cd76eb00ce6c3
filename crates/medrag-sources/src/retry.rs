//! Bounded exponential-backoff retry with per-ID fallback for batch calls.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_backoff: Duration,
    /// Upper bound of the uniform jitter added to every backoff sleep.
    pub max_jitter: Duration,
    /// Cool-down between chunks, independent of the rate limiter.
    pub chunk_pause: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff: Duration::from_millis(800),
            max_jitter: Duration::from_millis(400),
            chunk_pause: Duration::from_millis(350),
        }
    }
}

impl RetryPolicy {
    /// `base * 2^(attempt-1)` plus uniform jitter; attempt is 1-based.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp = self.base_backoff * 2u32.saturating_pow(attempt.saturating_sub(1));
        let jitter = if self.max_jitter.is_zero() {
            Duration::ZERO
        } else {
            let micros = rand::thread_rng().gen_range(0..=self.max_jitter.as_micros() as u64);
            Duration::from_micros(micros)
        };
        exp + jitter
    }
}

/// Run `op` until it succeeds or the retry ceiling is hit, sleeping the
/// backoff delay between attempts. Returns the last error on exhaustion.
pub async fn retrying<T, E, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                if attempt > policy.max_retries {
                    return Err(err);
                }
                tokio::time::sleep(policy.backoff_delay(attempt)).await;
            }
        }
    }
}

/// Run a batch ID operation chunk by chunk with retry, degrading to
/// per-ID calls when a chunk's batch call exhausts its retries.
///
/// A single ID whose own retries are exhausted is logged and dropped;
/// this function never errors. Each chunk is followed by the policy's
/// cool-down pause, whether the batch succeeded or fell back.
pub async fn batch_with_fallback<T, F, Fut, G, GFut>(
    policy: &RetryPolicy,
    ids: &[String],
    chunk_size: usize,
    batch_op: F,
    single_op: G,
) -> Vec<T>
where
    F: Fn(Vec<String>) -> Fut,
    Fut: Future<Output = anyhow::Result<Vec<T>>>,
    G: Fn(String) -> GFut,
    GFut: Future<Output = anyhow::Result<Vec<T>>>,
{
    let mut out = Vec::new();
    for chunk in ids.chunks(chunk_size.max(1)) {
        match retrying(policy, || batch_op(chunk.to_vec())).await {
            Ok(mut items) => out.append(&mut items),
            Err(err) => {
                warn!(
                    n = chunk.len(),
                    error = %err,
                    "batch call exhausted retries, falling back to per-ID calls"
                );
                for id in chunk {
                    match retrying(policy, || single_op(id.clone())).await {
                        Ok(mut items) => out.append(&mut items),
                        Err(err) => {
                            warn!(id = %id, error = %err, "per-ID call permanently failed, dropping");
                        }
                    }
                }
            }
        }
        tokio::time::sleep(policy.chunk_pause).await;
    }
    out
}
