use std::future::Future;
use std::time::{Duration, SystemTime};

use log::warn;
use reqwest::StatusCode;
use retry_policies::{Jitter, RetryDecision, RetryPolicy as _};
use retry_policies::policies::ExponentialBackoff;

use crate::error::MarketError;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base: Duration,
    pub max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            base: Duration::from_secs(1),
            max: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Doubling backoff from `base` capped at `max`, without jitter. Allows
    /// `max_attempts - 1` retries after the first call.
    pub fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff::builder()
            .retry_bounds(self.base, self.max.max(self.base))
            .jitter(Jitter::None)
            .build_with_max_retries(self.max_attempts.saturating_sub(1))
    }

    /// Wait before the next retry after `past_retries` retries, or `None`
    /// once the budget is spent.
    pub fn delay(&self, past_retries: u32) -> Option<Duration> {
        next_delay(&self.backoff(), SystemTime::now(), past_retries)
    }

    /// Runs `op` until it succeeds, fails terminally, or the attempt budget
    /// is spent. A budget exhausted by throttling becomes `RateLimited`.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, MarketError>
        where F: FnMut() -> Fut,
              Fut: Future<Output = Result<T, MarketError>>
    {
        let backoff = self.backoff();
        let started = SystemTime::now();
        let mut past_retries = 0;

        loop {
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !err.is_transient() {
                return Err(err);
            }

            let attempts = past_retries + 1;
            let delay = match next_delay(&backoff, started, past_retries) {
                Some(delay) => delay,
                None => return match err {
                    MarketError::Status { status } if status == StatusCode::TOO_MANY_REQUESTS =>
                        Err(MarketError::RateLimited { attempts }),
                    err => Err(err),
                },
            };

            warn!("{} failed (attempt {}/{}), retrying in {:?}. Cause: {}",
                  operation, attempts, self.max_attempts.max(1), delay, err);
            tokio::time::sleep(delay).await;
            past_retries += 1;
        }
    }
}

fn next_delay(backoff: &ExponentialBackoff, started: SystemTime, past_retries: u32) -> Option<Duration> {
    let decided_at = SystemTime::now();
    match backoff.should_retry(started, past_retries) {
        RetryDecision::Retry { execute_after } =>
            Some(execute_after.duration_since(decided_at).unwrap_or_default()),
        RetryDecision::DoNotRetry => None,
    }
}
