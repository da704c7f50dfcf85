use serde::{Deserialize, Serialize};

use crate::modules::catalog::domain::value_objects::AnimeStatus;

/// Upstream search request; only the text is required, the rest are hints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamSearch {
    pub text: String,
    pub status: Option<AnimeStatus>,
    pub genres: Vec<String>,
    pub page: u32,
    pub limit: u32,
}

impl UpstreamSearch {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: None,
            genres: Vec::new(),
            page: 1,
            limit: 25,
        }
    }
}
