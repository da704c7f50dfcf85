use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::shared::errors::AppError;

/// Stable external id shared by all three tiers (MyAnimeList id)
pub type MalId = u32;

/// Catalog entity types resolvable through the tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Anime,
    Character,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Anime => "anime",
            EntityKind::Character => "character",
        }
    }

    /// Cache key for a single entity: `entity:{type}:{id}`
    pub fn cache_key(&self, id: MalId) -> String {
        format!("entity:{}:{}", self.as_str(), id)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "anime" => Ok(EntityKind::Anime),
            "character" | "characters" => Ok(EntityKind::Character),
            other => Err(AppError::InvalidInput(format!(
                "Unknown entity type '{}'",
                other
            ))),
        }
    }
}
