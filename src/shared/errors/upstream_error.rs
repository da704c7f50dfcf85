use std::time::Duration;
use thiserror::Error;

/// Failures reported by the upstream metadata service.
///
/// `NotFound` is a verified absence; every other variant is transient and
/// must be retried on a later request rather than remembered.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UpstreamError {
    #[error("Resource not found upstream: {resource}")]
    NotFound { resource: String },

    #[error("Rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Upstream request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Upstream transport failure: {0}")]
    Transport(String),

    #[error("Upstream returned HTTP {status}")]
    Status { status: u16 },

    #[error("Invalid upstream response: {message}")]
    InvalidResponse { message: String },
}

impl UpstreamError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        UpstreamError::NotFound {
            resource: resource.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, UpstreamError::NotFound { .. })
    }

    pub fn is_transient(&self) -> bool {
        !self.is_not_found()
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout(Duration::ZERO)
        } else if let Some(status) = err.status() {
            match status.as_u16() {
                404 => UpstreamError::not_found(
                    err.url().map(|u| u.to_string()).unwrap_or_default(),
                ),
                429 => UpstreamError::RateLimited { retry_after: None },
                code => UpstreamError::Status { status: code },
            }
        } else if err.is_decode() {
            UpstreamError::InvalidResponse {
                message: err.to_string(),
            }
        } else {
            UpstreamError::Transport(err.to_string())
        }
    }
}

pub type UpstreamResult<T> = Result<T, UpstreamError>;
