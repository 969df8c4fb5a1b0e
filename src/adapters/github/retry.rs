//! Retry policy for GitHub requests.
//!
//! Two kinds of transient failure are retried:
//! - rate limiting (403/429): wait as long as the response headers say, plus
//!   a small buffer; the exponential schedule does not advance
//! - server errors (500/502/503/504) and network failures: exponential
//!   backoff starting at `initial_backoff`, doubling, capped at `max_backoff`
//!
//! Every retry, of either kind, uses up one of `max_attempts`.

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use tracing::debug;

use crate::domain::models::RetryConfig;

/// How the retry loop treats a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    Success,
    RateLimited,
    ServerError,
    /// Any other status; handed back to the caller without retry.
    Terminal,
}

impl ResponseClass {
    pub fn of(status: StatusCode) -> Self {
        match status.as_u16() {
            200..=299 => Self::Success,
            403 | 429 => Self::RateLimited,
            500 | 502 | 503 | 504 => Self::ServerError,
            _ => Self::Terminal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
    rate_limit_buffer: Duration,
    default_rate_limit_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn new(
        max_attempts: u32,
        initial_backoff: Duration,
        max_backoff: Duration,
        rate_limit_buffer: Duration,
        default_rate_limit_wait: Duration,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            max_backoff,
            rate_limit_buffer,
            default_rate_limit_wait,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.initial_backoff_ms),
            Duration::from_millis(config.max_backoff_ms),
            Duration::from_secs(config.rate_limit_buffer_secs),
            Duration::from_secs(config.default_rate_limit_wait_secs),
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Backoff before the retry that follows the `step`-th transient failure
    /// (0-indexed): `initial * 2^step`, capped at the maximum.
    pub fn backoff_for(&self, step: u32) -> Duration {
        let factor = 2_u32.saturating_pow(step);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// How long to wait after a rate-limited response.
    ///
    /// Precedence: `retry-after`, then `x-ratelimit-reset` when
    /// `x-ratelimit-remaining` is `0`, then the default wait. The buffer is
    /// added in every case. `now_epoch_secs` is the current Unix time.
    pub fn rate_limit_wait(&self, headers: &HeaderMap, now_epoch_secs: i64) -> Duration {
        if let Some(raw) = header_str(headers, "retry-after") {
            match raw.trim().parse::<u64>() {
                Ok(secs) => return Duration::from_secs(secs) + self.rate_limit_buffer,
                Err(_) => debug!(value = raw, "Ignoring invalid retry-after header"),
            }
        }

        if header_str(headers, "x-ratelimit-remaining").map(str::trim) == Some("0") {
            if let Some(raw) = header_str(headers, "x-ratelimit-reset") {
                match raw.trim().parse::<i64>() {
                    Ok(reset) => {
                        let until_reset = u64::try_from(reset - now_epoch_secs).unwrap_or(0);
                        return Duration::from_secs(until_reset) + self.rate_limit_buffer;
                    }
                    Err(_) => debug!(value = raw, "Ignoring invalid x-ratelimit-reset header"),
                }
            }
        }

        self.default_rate_limit_wait + self.rate_limit_buffer
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
