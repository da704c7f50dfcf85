use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::modules::catalog::domain::value_objects::{
    AnimeStatus, BroadcastInfo, Genre, ImageSet, MalId,
};

/// Title variants for an anime
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimeTitles {
    /// Default (romanized) title, always present after normalization
    pub main: String,
    pub english: Option<String>,
    pub japanese: Option<String>,
    pub synonyms: Vec<String>,
}

impl AnimeTitles {
    /// Every title variant, main first
    pub fn all(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.main.as_str())
            .chain(self.english.as_deref())
            .chain(self.japanese.as_deref())
            .chain(self.synonyms.iter().map(String::as_str))
    }
}

/// Normalized anime record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anime {
    pub mal_id: MalId,
    pub titles: AnimeTitles,
    pub images: ImageSet,
    pub anime_type: Option<String>,
    pub source: Option<String>,
    pub episodes: Option<u32>,
    pub status: AnimeStatus,
    pub airing: bool,
    pub duration: Option<String>,
    pub rating: Option<String>,
    pub score: Option<f32>,
    pub scored_by: Option<u32>,
    pub rank: Option<u32>,
    pub popularity: Option<u32>,
    pub members: Option<u32>,
    pub favorites: Option<u32>,
    pub synopsis: Option<String>,
    pub season: Option<String>,
    pub year: Option<i32>,
    pub broadcast: BroadcastInfo,
    pub genres: Vec<Genre>,
    pub themes: Vec<Genre>,
    pub studios: Vec<String>,
    /// Set when the record was last normalized from upstream data
    pub last_updated: DateTime<Utc>,
}

impl Anime {
    /// Minimal record; everything except id and title defaults to empty
    pub fn new(mal_id: MalId, title: impl Into<String>, last_updated: DateTime<Utc>) -> Self {
        Self {
            mal_id,
            titles: AnimeTitles {
                main: title.into(),
                ..AnimeTitles::default()
            },
            images: ImageSet::default(),
            anime_type: None,
            source: None,
            episodes: None,
            status: AnimeStatus::Unknown,
            airing: false,
            duration: None,
            rating: None,
            score: None,
            scored_by: None,
            rank: None,
            popularity: None,
            members: None,
            favorites: None,
            synopsis: None,
            season: None,
            year: None,
            broadcast: BroadcastInfo::unknown(),
            genres: Vec::new(),
            themes: Vec::new(),
            studios: Vec::new(),
            last_updated,
        }
    }

    pub fn title(&self) -> &str {
        &self.titles.main
    }

    /// Genre names including themes, as used by genre filters
    pub fn genre_names(&self) -> impl Iterator<Item = &str> {
        self.genres
            .iter()
            .chain(self.themes.iter())
            .map(|g| g.name.as_str())
    }

    pub fn has_genre(&self, name: &str) -> bool {
        self.genres
            .iter()
            .chain(self.themes.iter())
            .any(|g| g.matches(name))
    }
}
