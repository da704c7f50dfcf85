use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::modules::catalog::domain::value_objects::{ImageSet, MalId};

/// Anime a character appears in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterAppearance {
    pub mal_id: MalId,
    pub title: String,
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceActor {
    pub mal_id: MalId,
    pub name: String,
    pub language: Option<String>,
}

/// Normalized character record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub mal_id: MalId,
    pub name: String,
    pub name_kanji: Option<String>,
    pub nicknames: Vec<String>,
    pub about: Option<String>,
    pub favorites: Option<u32>,
    pub images: ImageSet,
    pub anime: Vec<CharacterAppearance>,
    pub voice_actors: Vec<VoiceActor>,
    pub last_updated: DateTime<Utc>,
}

impl Character {
    pub fn new(mal_id: MalId, name: impl Into<String>, last_updated: DateTime<Utc>) -> Self {
        Self {
            mal_id,
            name: name.into(),
            name_kanji: None,
            nicknames: Vec::new(),
            about: None,
            favorites: None,
            images: ImageSet::default(),
            anime: Vec::new(),
            voice_actors: Vec::new(),
            last_updated,
        }
    }

    /// Name variants used for text search
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str())
            .chain(self.name_kanji.as_deref())
            .chain(self.nicknames.iter().map(String::as_str))
    }
}
