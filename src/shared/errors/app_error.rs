use serde::Serialize;
use thiserror::Error;

/// Infrastructure-facing failures.
///
/// Upstream problems never end up here: they degrade to fewer results or a
/// `Resolution::Unavailable`. Anything in this enum means the cache or the
/// catalog store could not do its job and the request must fail visibly.
#[derive(Error, Debug, Clone, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AppError {
    /// True for failures of the cache or catalog store themselves.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            AppError::DatabaseError(_) | AppError::CacheError(_) | AppError::ServiceUnavailable(_)
        )
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(err: diesel::result::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<diesel::r2d2::PoolError> for AppError {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        AppError::DatabaseError(format!("Database pool error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerializationError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::InternalError(format!("Background task failed: {}", err))
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(err: std::num::ParseIntError) -> Self {
        AppError::InvalidInput(format!("Invalid number: {}", err))
    }
}

impl From<std::num::ParseFloatError> for AppError {
    fn from(err: std::num::ParseFloatError) -> Self {
        AppError::InvalidInput(format!("Invalid decimal number: {}", err))
    }
}

// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diesel_not_found_is_a_database_error() {
        let err: AppError = diesel::result::Error::NotFound.into();
        assert!(matches!(err, AppError::DatabaseError(_)));
        assert!(err.is_infrastructure());
    }

    #[test]
    fn serialization_errors_are_not_infrastructure() {
        let err: AppError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, AppError::SerializationError(_)));
        assert!(!err.is_infrastructure());
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(AppError::CacheError("down".into())).unwrap();
        assert_eq!(json["type"], "CacheError");
        assert_eq!(json["message"], "down");
    }
}
