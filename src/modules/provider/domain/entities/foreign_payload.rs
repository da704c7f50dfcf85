// Upstream (Jikan v4) record shapes, as delivered over the wire.
// Every field is optional: the upstream omits or nulls fields freely, and the
// normalizer decides what a missing value becomes.

use serde::{Deserialize, Serialize};

use crate::modules::catalog::domain::value_objects::{EntityKind, MalId};

/// A single upstream record of either entity kind
#[derive(Debug, Clone, PartialEq)]
pub enum ForeignPayload {
    Anime(ForeignAnime),
    Character(ForeignCharacter),
}

impl ForeignPayload {
    pub fn kind(&self) -> EntityKind {
        match self {
            ForeignPayload::Anime(_) => EntityKind::Anime,
            ForeignPayload::Character(_) => EntityKind::Character,
        }
    }

    pub fn mal_id(&self) -> Option<MalId> {
        match self {
            ForeignPayload::Anime(a) => a.mal_id,
            ForeignPayload::Character(c) => c.mal_id,
        }
    }
}

// Shared primitives
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForeignImageUrls {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub small_image_url: Option<String>,
    #[serde(default)]
    pub large_image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForeignImages {
    #[serde(default)]
    pub jpg: Option<ForeignImageUrls>,
    #[serde(default)]
    pub webp: Option<ForeignImageUrls>,
}

/// Genre, theme, studio or person reference
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForeignRef {
    #[serde(default)]
    pub mal_id: Option<MalId>,
    #[serde(default)]
    pub r#type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForeignTitle {
    #[serde(default)]
    pub r#type: Option<String>, // "Default", "English", "Japanese", "Synonym"
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForeignBroadcast {
    #[serde(default)]
    pub day: Option<String>, // "Saturdays"
    #[serde(default)]
    pub time: Option<String>, // "01:00"
    #[serde(default)]
    pub timezone: Option<String>, // "Asia/Tokyo"
    #[serde(default)]
    pub string: Option<String>,
}

// Anime
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForeignAnime {
    #[serde(default)]
    pub mal_id: Option<MalId>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub images: Option<ForeignImages>,
    #[serde(default)]
    pub titles: Option<Vec<ForeignTitle>>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub title_english: Option<String>,
    #[serde(default)]
    pub title_japanese: Option<String>,
    #[serde(default)]
    pub title_synonyms: Option<Vec<String>>,
    #[serde(default)]
    pub r#type: Option<String>, // TV, Movie, OVA
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub episodes: Option<i64>,
    #[serde(default)]
    pub status: Option<String>, // "Currently Airing"
    #[serde(default)]
    pub airing: Option<bool>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub scored_by: Option<i64>,
    #[serde(default)]
    pub rank: Option<i64>,
    #[serde(default)]
    pub popularity: Option<i64>,
    #[serde(default)]
    pub members: Option<i64>,
    #[serde(default)]
    pub favorites: Option<i64>,
    #[serde(default)]
    pub synopsis: Option<String>,
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub broadcast: Option<ForeignBroadcast>,
    #[serde(default)]
    pub genres: Option<Vec<ForeignRef>>,
    #[serde(default)]
    pub themes: Option<Vec<ForeignRef>>,
    #[serde(default)]
    pub studios: Option<Vec<ForeignRef>>,
}

// Characters (`/characters/{id}/full`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForeignAnimeRef {
    #[serde(default)]
    pub mal_id: Option<MalId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub images: Option<ForeignImages>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForeignAppearance {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub anime: Option<ForeignAnimeRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForeignVoice {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub person: Option<ForeignRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForeignCharacter {
    #[serde(default)]
    pub mal_id: Option<MalId>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub images: Option<ForeignImages>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub name_kanji: Option<String>,
    #[serde(default)]
    pub nicknames: Option<Vec<String>>,
    #[serde(default)]
    pub favorites: Option<i64>,
    #[serde(default)]
    pub about: Option<String>,
    #[serde(default)]
    pub anime: Option<Vec<ForeignAppearance>>,
    #[serde(default)]
    pub voices: Option<Vec<ForeignVoice>>,
}
