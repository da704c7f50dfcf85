use serde::{Deserialize, Serialize};

use super::entity_kind::MalId;

/// Poster/portrait image variants; any of them may be missing upstream
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSet {
    pub image_url: Option<String>,
    pub small_image_url: Option<String>,
    pub large_image_url: Option<String>,
    pub webp_image_url: Option<String>,
}

impl ImageSet {
    /// Largest available variant
    pub fn best(&self) -> Option<&str> {
        self.large_image_url
            .as_deref()
            .or(self.image_url.as_deref())
            .or(self.small_image_url.as_deref())
            .or(self.webp_image_url.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.best().is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Genre {
    pub mal_id: MalId,
    pub name: String,
}

impl Genre {
    pub fn new(mal_id: MalId, name: impl Into<String>) -> Self {
        Self {
            mal_id,
            name: name.into(),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name.trim())
    }
}
