use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::modules::catalog::domain::{
    entities::{Anime, Character, Entity},
    value_objects::{AnimeStatus, EntityKind, MalId},
};
use crate::schema::{catalog_anime, catalog_characters};
use crate::shared::errors::{AppError, AppResult};

// ================== ANIME ==================

/// Anime row as written. Scalar columns back filtering and sorting; the full
/// record lives in `document`.
#[derive(Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = catalog_anime)]
#[diesel(treat_none_as_null = true)]
pub struct AnimeRow {
    pub mal_id: i32,
    pub title: String,
    pub title_english: Option<String>,
    pub title_japanese: Option<String>,
    pub search_text: String,
    pub status: AnimeStatus,
    pub genres: Vec<String>,
    pub broadcast_day: String,
    pub broadcast_time: Option<String>,
    pub score: Option<f32>,
    pub popularity: Option<i32>,
    pub favorites: Option<i32>,
    pub document: serde_json::Value,
    pub last_updated: DateTime<Utc>,
}

impl AnimeRow {
    pub fn from_domain(anime: &Anime) -> AppResult<Self> {
        Ok(Self {
            mal_id: to_db_id(anime.mal_id)?,
            title: anime.titles.main.clone(),
            title_english: anime.titles.english.clone(),
            title_japanese: anime.titles.japanese.clone(),
            search_text: search_text(anime.titles.all()),
            status: anime.status,
            genres: anime.genre_names().map(str::to_lowercase).collect(),
            broadcast_day: anime.broadcast.day.as_str().to_string(),
            broadcast_time: anime.broadcast.time.clone(),
            score: anime.score,
            popularity: anime.popularity.map(to_db_count),
            favorites: anime.favorites.map(to_db_count),
            document: serde_json::to_value(anime)?,
            last_updated: anime.last_updated,
        })
    }
}

// ================== CHARACTERS ==================

#[derive(Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = catalog_characters)]
#[diesel(treat_none_as_null = true)]
pub struct CharacterRow {
    pub mal_id: i32,
    pub name: String,
    pub search_text: String,
    pub favorites: Option<i32>,
    pub document: serde_json::Value,
    pub last_updated: DateTime<Utc>,
}

impl CharacterRow {
    pub fn from_domain(character: &Character) -> AppResult<Self> {
        Ok(Self {
            mal_id: to_db_id(character.mal_id)?,
            name: character.name.clone(),
            search_text: search_text(character.names()),
            favorites: character.favorites.map(to_db_count),
            document: serde_json::to_value(character)?,
            last_updated: character.last_updated,
        })
    }
}

/// Rebuild an entity from the `document` column of the table for `kind`
pub fn entity_from_document(kind: EntityKind, document: serde_json::Value) -> AppResult<Entity> {
    Ok(match kind {
        EntityKind::Anime => Entity::Anime(serde_json::from_value(document)?),
        EntityKind::Character => Entity::Character(serde_json::from_value(document)?),
    })
}

pub fn to_db_id(id: MalId) -> AppResult<i32> {
    i32::try_from(id).map_err(|_| AppError::InvalidInput(format!("Id {} is out of range", id)))
}

fn to_db_count(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Newline-joined name variants; `ILIKE` over this matches any one variant
fn search_text<'a>(variants: impl Iterator<Item = &'a str>) -> String {
    variants.collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::catalog::domain::value_objects::{BroadcastDay, BroadcastInfo, Genre};

    #[test]
    fn anime_row_lowercases_genres_and_keeps_document() {
        let mut anime = Anime::new(5114, "Fullmetal Alchemist: Brotherhood", Utc::now());
        anime.titles.english = Some("Fullmetal Alchemist: Brotherhood".into());
        anime.genres = vec![Genre::new(1, "Action")];
        anime.themes = vec![Genre::new(38, "Military")];
        anime.broadcast = BroadcastInfo::new(BroadcastDay::Sundays, Some("17:00"));

        let row = AnimeRow::from_domain(&anime).unwrap();
        assert_eq!(row.mal_id, 5114);
        assert_eq!(row.genres, vec!["action", "military"]);
        assert_eq!(row.broadcast_day, "Sundays");

        let restored = entity_from_document(EntityKind::Anime, row.document).unwrap();
        assert_eq!(restored, Entity::Anime(anime));
    }

    #[test]
    fn ids_beyond_column_range_are_rejected() {
        assert!(to_db_id(u32::MAX).is_err());
        assert_eq!(to_db_id(11).unwrap(), 11);
    }
}
