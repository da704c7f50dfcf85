//! Retry policy for upstream requests
//!
//! Rate-limit responses honour the server's `Retry-After` hint; everything
//! else backs off exponentially with a little jitter.

use rand::Rng;
use std::time::Duration;

/// Configuration for HTTP retry behavior
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts after the first request
    pub max_retries: u32,
    pub base_delay: Duration,
    /// Upper bound on any single wait, including server-provided ones
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    /// Fraction of the computed delay added as random jitter (0.0 disables)
    pub jitter: f64,
}

impl RetryPolicy {
    /// Jikan allows roughly one request per second; keep retries short so a
    /// single resolve stays within the resolver's upstream timeout
    pub fn jikan() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(4),
            backoff_multiplier: 2.0,
            jitter: 0.25,
        }
    }

    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            jitter: 0.0,
        }
    }

    /// Delay before retry number `attempt` (0-based)
    pub fn calculate_delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        if let Some(server_delay) = retry_after {
            return server_delay.min(self.max_delay);
        }

        let multiplier = self.backoff_multiplier.powi(attempt as i32);
        let base_ms = self.base_delay.as_millis() as f64 * multiplier;
        let jitter_ms = if self.jitter > 0.0 && base_ms > 0.0 {
            rand::thread_rng().gen_range(0.0..=base_ms * self.jitter)
        } else {
            0.0
        };

        Duration::from_millis((base_ms + jitter_ms) as u64).min(self.max_delay)
    }
}

/// Rate-limit hints extracted from a 429 response
#[derive(Debug, Clone, Default)]
pub struct RateLimitInfo {
    /// From the `Retry-After` header
    pub retry_after: Option<Duration>,
    /// From `X-RateLimit-Remaining`
    pub remaining: Option<u32>,
}

impl RateLimitInfo {
    pub fn from_headers(headers: &reqwest::header::HeaderMap) -> Self {
        let retry_after = headers
            .get("retry-after")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_secs);

        let remaining = headers
            .get("x-ratelimit-remaining")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.trim().parse::<u32>().ok());

        Self {
            retry_after,
            remaining,
        }
    }
}

/// Status codes worth another attempt
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 425 | 429 | 500..=599)
}

/// Network failures worth another attempt
pub fn is_retryable_error(error: &reqwest::Error) -> bool {
    match error.status() {
        Some(status) => is_retryable_status(status.as_u16()),
        None => error.is_timeout() || error.is_connect(),
    }
}
