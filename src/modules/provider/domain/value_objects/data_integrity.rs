use serde::{Deserialize, Serialize};
use std::fmt;

/// Unexpected upstream shape that was replaced by a default during
/// normalization. Never fails a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataIntegrityWarning {
    pub field: String,
    pub detail: String,
}

impl DataIntegrityWarning {
    pub fn new(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for DataIntegrityWarning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.detail)
    }
}

/// Normalized record plus everything that had to be defaulted on the way
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    pub entity: T,
    pub warnings: Vec<DataIntegrityWarning>,
}

impl<T> Normalized<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Normalized<U> {
        Normalized {
            entity: f(self.entity),
            warnings: self.warnings,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}
