//! HTTP client with client-side rate limiting and retries
//!
//! Every request waits on a token bucket before going out. Responses are
//! classified into [`UpstreamError`] kinds so callers can tell a verified
//! absence (404) apart from transient trouble.

use super::retry_policy::{is_retryable_error, is_retryable_status, RateLimitInfo, RetryPolicy};
use crate::shared::errors::{AppError, AppResult, UpstreamError, UpstreamResult};
use crate::shared::utils::logger::LogContext;
use governor::{Quota, RateLimiter as GovernorRateLimiter};
use reqwest::{Client, Response, StatusCode};
use std::num::NonZeroU32;
use std::time::{Duration, Instant};
use tokio::time::sleep;

type DirectRateLimiter = GovernorRateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
    governor::middleware::NoOpMiddleware,
>;

const USER_AGENT: &str = concat!("miru-catalog/", env!("CARGO_PKG_VERSION"));
/// Slowest refill accepted; lower rates are clamped to one request per hour
const MAX_REQUEST_PERIOD: Duration = Duration::from_secs(60 * 60);

pub struct RateLimitClient {
    client: Client,
    rate_limiter: DirectRateLimiter,
    retry_policy: RetryPolicy,
    provider_name: String,
}

impl RateLimitClient {
    /// Client for Jikan with the given request rate and burst
    pub fn for_jikan(
        requests_per_second: f64,
        burst: u32,
        request_timeout: Duration,
    ) -> AppResult<Self> {
        Self::new(
            "Jikan",
            RetryPolicy::jikan(),
            Self::create_rate_limiter(requests_per_second, burst),
            request_timeout,
        )
    }

    pub fn new(
        provider_name: &str,
        retry_policy: RetryPolicy,
        rate_limiter: DirectRateLimiter,
        request_timeout: Duration,
    ) -> AppResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(request_timeout)
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            rate_limiter,
            retry_policy,
            provider_name: provider_name.to_string(),
        })
    }

    /// Token bucket allowing `burst_size` immediate requests, refilled at
    /// `requests_per_second`
    pub fn create_rate_limiter(requests_per_second: f64, burst_size: u32) -> DirectRateLimiter {
        let period = if requests_per_second > 0.0 {
            Duration::try_from_secs_f64(1.0 / requests_per_second)
                .unwrap_or(MAX_REQUEST_PERIOD)
                .min(MAX_REQUEST_PERIOD)
        } else {
            Duration::from_secs(1)
        };

        let burst = NonZeroU32::new(burst_size.max(1)).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::with_period(period)
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
            .allow_burst(burst);

        GovernorRateLimiter::direct(quota)
    }

    /// GET and decode a JSON body, retrying transient failures
    pub async fn get<T>(&self, url: &str) -> UpstreamResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let start = Instant::now();
        let result = self.get_with_retries(url).await;

        let status = match &result {
            Ok(_) => "ok".to_string(),
            Err(e) => e.to_string(),
        };
        LogContext::api_call(
            &self.provider_name,
            url,
            &status,
            Some(start.elapsed().as_millis() as u64),
        );
        result
    }

    async fn get_with_retries<T>(&self, url: &str) -> UpstreamResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let max_attempts = self.retry_policy.max_retries + 1;
        let mut attempt = 0;

        loop {
            self.rate_limiter.until_ready().await;

            let (error, retry_after) = match self.client.get(url).send().await {
                Ok(response) if response.status().is_success() => {
                    return self.parse_response(response).await;
                }
                Ok(response) => {
                    let status = response.status();
                    if status == StatusCode::NOT_FOUND {
                        return Err(UpstreamError::not_found(url));
                    }

                    let info = RateLimitInfo::from_headers(response.headers());
                    let error = if status == StatusCode::TOO_MANY_REQUESTS {
                        UpstreamError::RateLimited {
                            retry_after: info.retry_after,
                        }
                    } else {
                        UpstreamError::Status {
                            status: status.as_u16(),
                        }
                    };

                    if !is_retryable_status(status.as_u16()) || attempt + 1 >= max_attempts {
                        return Err(error);
                    }
                    (error, info.retry_after)
                }
                Err(e) => {
                    if !is_retryable_error(&e) || attempt + 1 >= max_attempts {
                        return Err(e.into());
                    }
                    (e.into(), None)
                }
            };

            let delay = self.retry_policy.calculate_delay(attempt, retry_after);
            log::warn!(
                "{} request failed (attempt {}/{}): {}. Retrying in {:?}",
                self.provider_name,
                attempt + 1,
                max_attempts,
                error,
                delay
            );
            sleep(delay).await;
            attempt += 1;
        }
    }

    async fn parse_response<T>(&self, response: Response) -> UpstreamResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| UpstreamError::InvalidResponse {
            message: format!(
                "Failed to parse {} response: {}. Response: {}",
                self.provider_name,
                e,
                truncate(&body, 200)
            ),
        })
    }

    pub fn can_make_request_now(&self) -> bool {
        self.rate_limiter.check().is_ok()
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_allows_immediate_requests() {
        let client =
            RateLimitClient::for_jikan(1.0, 3, Duration::from_secs(5)).expect("client builds");
        assert_eq!(client.provider_name(), "Jikan");
        assert!(client.can_make_request_now());
        assert!(client.can_make_request_now());
        assert!(client.can_make_request_now());
        assert!(!client.can_make_request_now());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("鋼の錬金術師", 3), "鋼の錬...");
        assert_eq!(truncate("short", 200), "short");
    }

    #[test]
    fn tiny_rate_is_capped_instead_of_overflowing() {
        let limiter = RateLimitClient::create_rate_limiter(1e-300, 1);
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_err());

        let limiter = RateLimitClient::create_rate_limiter(f64::MIN_POSITIVE, 1);
        assert!(limiter.check().is_ok());
    }
}
