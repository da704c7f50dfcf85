use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{anime::Anime, character::Character};
use crate::modules::catalog::domain::value_objects::{EntityKind, MalId};

/// Any catalog entity the resolver can hand out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Entity {
    Anime(Anime),
    Character(Character),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Anime(_) => EntityKind::Anime,
            Entity::Character(_) => EntityKind::Character,
        }
    }

    pub fn mal_id(&self) -> MalId {
        match self {
            Entity::Anime(a) => a.mal_id,
            Entity::Character(c) => c.mal_id,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Entity::Anime(a) => a.title(),
            Entity::Character(c) => &c.name,
        }
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        match self {
            Entity::Anime(a) => a.last_updated,
            Entity::Character(c) => c.last_updated,
        }
    }

    /// Title or name variants matched by free-text search
    pub fn search_terms(&self) -> Vec<&str> {
        match self {
            Entity::Anime(a) => a.titles.all().collect(),
            Entity::Character(c) => c.names().collect(),
        }
    }

    pub fn as_anime(&self) -> Option<&Anime> {
        match self {
            Entity::Anime(a) => Some(a),
            Entity::Character(_) => None,
        }
    }

    pub fn into_anime(self) -> Option<Anime> {
        match self {
            Entity::Anime(a) => Some(a),
            Entity::Character(_) => None,
        }
    }

    pub fn as_character(&self) -> Option<&Character> {
        match self {
            Entity::Character(c) => Some(c),
            Entity::Anime(_) => None,
        }
    }

    pub fn into_character(self) -> Option<Character> {
        match self {
            Entity::Character(c) => Some(c),
            Entity::Anime(_) => None,
        }
    }
}

impl From<Anime> for Entity {
    fn from(anime: Anime) -> Self {
        Entity::Anime(anime)
    }
}

impl From<Character> for Entity {
    fn from(character: Character) -> Self {
        Entity::Character(character)
    }
}
