//! Jikan payload → catalog entity normalization
//!
//! Pure functions: the only time-dependent field is `last_updated`, which is
//! taken from the caller. Missing or malformed fields are replaced by
//! defaults and reported as [`DataIntegrityWarning`]s; only a payload without
//! an id is rejected, since nothing downstream can key it.

use chrono::{DateTime, Utc};

use crate::modules::catalog::domain::{
    entities::{Anime, AnimeTitles, Character, CharacterAppearance, Entity, VoiceActor},
    value_objects::{AnimeStatus, BroadcastDay, BroadcastInfo, Genre, ImageSet, SOURCE_TIMEZONE},
};
use crate::modules::provider::domain::{
    entities::{ForeignAnime, ForeignBroadcast, ForeignCharacter, ForeignImages, ForeignPayload, ForeignRef},
    value_objects::{DataIntegrityWarning, Normalized},
};
use crate::shared::errors::{UpstreamError, UpstreamResult};

pub fn normalize_payload(
    payload: ForeignPayload,
    observed_at: DateTime<Utc>,
) -> UpstreamResult<Normalized<Entity>> {
    match payload {
        ForeignPayload::Anime(raw) => Ok(normalize_anime(raw, observed_at)?.map(Entity::Anime)),
        ForeignPayload::Character(raw) => {
            Ok(normalize_character(raw, observed_at)?.map(Entity::Character))
        }
    }
}

pub fn normalize_anime(
    raw: ForeignAnime,
    observed_at: DateTime<Utc>,
) -> UpstreamResult<Normalized<Anime>> {
    let mal_id = raw.mal_id.ok_or_else(|| UpstreamError::InvalidResponse {
        message: "anime payload without mal_id".to_string(),
    })?;
    let mut warnings = Vec::new();

    let titles = extract_titles(&raw, &mut warnings);
    let status = extract_status(raw.status.as_deref(), &mut warnings);
    let broadcast = extract_broadcast(raw.broadcast.as_ref(), &mut warnings);

    let anime = Anime {
        mal_id,
        titles,
        images: extract_images(raw.images.as_ref(), &mut warnings),
        anime_type: non_empty(raw.r#type),
        source: non_empty(raw.source),
        episodes: count("episodes", raw.episodes, &mut warnings),
        airing: raw.airing.unwrap_or(status == AnimeStatus::Airing),
        status,
        duration: non_empty(raw.duration),
        rating: non_empty(raw.rating),
        score: extract_score(raw.score, &mut warnings),
        scored_by: count("scored_by", raw.scored_by, &mut warnings),
        rank: count("rank", raw.rank, &mut warnings),
        popularity: count("popularity", raw.popularity, &mut warnings),
        members: count("members", raw.members, &mut warnings),
        favorites: count("favorites", raw.favorites, &mut warnings),
        synopsis: non_empty(raw.synopsis),
        season: non_empty(raw.season).map(|s| s.to_lowercase()),
        year: raw.year,
        broadcast,
        genres: extract_genres("genres", raw.genres.as_deref(), &mut warnings),
        themes: extract_genres("themes", raw.themes.as_deref(), &mut warnings),
        studios: raw
            .studios
            .unwrap_or_default()
            .into_iter()
            .filter_map(|studio| non_empty(studio.name))
            .collect(),
        last_updated: observed_at,
    };

    Ok(Normalized {
        entity: anime,
        warnings,
    })
}

pub fn normalize_character(
    raw: ForeignCharacter,
    observed_at: DateTime<Utc>,
) -> UpstreamResult<Normalized<Character>> {
    let mal_id = raw.mal_id.ok_or_else(|| UpstreamError::InvalidResponse {
        message: "character payload without mal_id".to_string(),
    })?;
    let mut warnings = Vec::new();

    let name = non_empty(raw.name).unwrap_or_else(|| {
        warnings.push(DataIntegrityWarning::new("name", "missing, using placeholder"));
        format!("Character #{}", mal_id)
    });

    let mut anime = Vec::new();
    for appearance in raw.anime.unwrap_or_default() {
        let Some(entry) = appearance.anime else {
            warnings.push(DataIntegrityWarning::new("anime", "appearance without anime"));
            continue;
        };
        match (entry.mal_id, non_empty(entry.title)) {
            (Some(id), Some(title)) => anime.push(CharacterAppearance {
                mal_id: id,
                title,
                role: non_empty(appearance.role),
            }),
            _ => warnings.push(DataIntegrityWarning::new(
                "anime",
                "appearance without id or title skipped",
            )),
        }
    }

    let mut voice_actors = Vec::new();
    for voice in raw.voices.unwrap_or_default() {
        let person = voice.person.unwrap_or_default();
        match (person.mal_id, non_empty(person.name)) {
            (Some(id), Some(name)) => voice_actors.push(VoiceActor {
                mal_id: id,
                name,
                language: non_empty(voice.language),
            }),
            _ => warnings.push(DataIntegrityWarning::new(
                "voices",
                "voice actor without id or name skipped",
            )),
        }
    }

    let character = Character {
        mal_id,
        name,
        name_kanji: non_empty(raw.name_kanji),
        nicknames: dedup(raw.nicknames.unwrap_or_default()),
        about: non_empty(raw.about),
        favorites: count("favorites", raw.favorites, &mut warnings),
        images: extract_images(raw.images.as_ref(), &mut warnings),
        anime,
        voice_actors,
        last_updated: observed_at,
    };

    Ok(Normalized {
        entity: character,
        warnings,
    })
}

fn extract_titles(raw: &ForeignAnime, warnings: &mut Vec<DataIntegrityWarning>) -> AnimeTitles {
    let entries = raw.titles.as_deref().unwrap_or_default();
    let title_of_type = |kind: &str| {
        entries
            .iter()
            .find(|t| t.r#type.as_deref() == Some(kind))
            .and_then(|t| non_empty(t.title.clone()))
    };

    let english = non_empty(raw.title_english.clone()).or_else(|| title_of_type("English"));
    let japanese = non_empty(raw.title_japanese.clone()).or_else(|| title_of_type("Japanese"));

    let main = non_empty(raw.title.clone())
        .or_else(|| title_of_type("Default"))
        .or_else(|| english.clone())
        .unwrap_or_else(|| {
            warnings.push(DataIntegrityWarning::new("title", "missing, using placeholder"));
            format!("Anime #{}", raw.mal_id.unwrap_or_default())
        });

    let synonyms = raw
        .title_synonyms
        .clone()
        .unwrap_or_default()
        .into_iter()
        .chain(
            entries
                .iter()
                .filter(|t| t.r#type.as_deref() == Some("Synonym"))
                .filter_map(|t| t.title.clone()),
        )
        .filter(|s| !s.trim().is_empty() && *s != main)
        .collect();

    AnimeTitles {
        main,
        english,
        japanese,
        synonyms: dedup(synonyms),
    }
}

fn extract_status(raw: Option<&str>, warnings: &mut Vec<DataIntegrityWarning>) -> AnimeStatus {
    let Some(label) = raw.filter(|s| !s.trim().is_empty()) else {
        return AnimeStatus::Unknown;
    };
    let status = AnimeStatus::from(label);
    if status == AnimeStatus::Unknown {
        warnings.push(DataIntegrityWarning::new(
            "status",
            format!("unrecognized value '{}'", label),
        ));
    }
    status
}

fn extract_broadcast(
    raw: Option<&ForeignBroadcast>,
    warnings: &mut Vec<DataIntegrityWarning>,
) -> BroadcastInfo {
    let Some(raw) = raw else {
        return BroadcastInfo::unknown();
    };

    let day = match raw.day.as_deref() {
        None => BroadcastDay::Other,
        Some(label) => BroadcastDay::parse(label).unwrap_or_else(|| {
            warnings.push(DataIntegrityWarning::new(
                "broadcast.day",
                format!("unrecognized value '{}'", label),
            ));
            BroadcastDay::Other
        }),
    };

    let info = BroadcastInfo::new(day, raw.time.as_deref())
        .with_display_string(non_empty(raw.string.clone()));

    if let Some(time) = raw.time.as_deref().filter(|t| !t.trim().is_empty()) {
        if info.time.is_none() {
            warnings.push(DataIntegrityWarning::new(
                "broadcast.time",
                format!("unparseable value '{}'", time),
            ));
        }
    }
    if let Some(tz) = raw.timezone.as_deref() {
        if tz != SOURCE_TIMEZONE.name() {
            warnings.push(DataIntegrityWarning::new(
                "broadcast.timezone",
                format!("'{}' reported, times kept as {}", tz, SOURCE_TIMEZONE.name()),
            ));
        }
    }

    info
}

fn extract_images(
    raw: Option<&ForeignImages>,
    warnings: &mut Vec<DataIntegrityWarning>,
) -> ImageSet {
    let jpg = raw.and_then(|i| i.jpg.clone()).unwrap_or_default();
    let webp = raw.and_then(|i| i.webp.clone()).unwrap_or_default();

    let images = ImageSet {
        image_url: jpg.image_url,
        small_image_url: jpg.small_image_url,
        large_image_url: jpg.large_image_url,
        webp_image_url: webp.large_image_url.or(webp.image_url),
    };
    if images.is_empty() {
        warnings.push(DataIntegrityWarning::new("images", "no image variants"));
    }
    images
}

fn extract_genres(
    field: &str,
    raw: Option<&[ForeignRef]>,
    warnings: &mut Vec<DataIntegrityWarning>,
) -> Vec<Genre> {
    let mut genres = Vec::new();
    for entry in raw.unwrap_or_default() {
        match non_empty(entry.name.clone()) {
            Some(name) => genres.push(Genre::new(entry.mal_id.unwrap_or_default(), name)),
            None => warnings.push(DataIntegrityWarning::new(field, "entry without name skipped")),
        }
    }
    genres
}

/// Scores live in (0, 10]; the upstream reports "unscored" as null or 0
fn extract_score(raw: Option<f64>, warnings: &mut Vec<DataIntegrityWarning>) -> Option<f32> {
    match raw {
        Some(score) if score > 0.0 && score <= 10.0 => Some(score as f32),
        Some(score) if score == 0.0 => None,
        Some(score) => {
            warnings.push(DataIntegrityWarning::new(
                "score",
                format!("out of range value {}", score),
            ));
            None
        }
        None => None,
    }
}

fn count(field: &str, raw: Option<i64>, warnings: &mut Vec<DataIntegrityWarning>) -> Option<u32> {
    let value = raw?;
    match u32::try_from(value) {
        Ok(v) => Some(v),
        Err(_) => {
            warnings.push(DataIntegrityWarning::new(
                field,
                format!("out of range value {}", value),
            ));
            None
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Remove duplicates, keeping first occurrences in order
fn dedup(values: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && seen.insert(v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn observed() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 7, 12, 0, 0).unwrap()
    }

    fn fmab_json() -> serde_json::Value {
        serde_json::json!({
            "mal_id": 5114,
            "title": "Fullmetal Alchemist: Brotherhood",
            "title_english": "Fullmetal Alchemist: Brotherhood",
            "title_japanese": "鋼の錬金術師 FULLMETAL ALCHEMIST",
            "title_synonyms": ["Hagane no Renkinjutsushi: Fullmetal Alchemist", "FMA:B"],
            "images": { "jpg": { "image_url": "https://cdn.myanimelist.net/images/anime/1223/96541.jpg" } },
            "type": "TV",
            "episodes": 64,
            "status": "Finished Airing",
            "airing": false,
            "score": 9.1,
            "popularity": 3,
            "favorites": 230000,
            "season": "Spring",
            "year": 2009,
            "broadcast": { "day": "Sundays", "time": "17:00", "timezone": "Asia/Tokyo", "string": "Sundays at 17:00 (JST)" },
            "genres": [ { "mal_id": 1, "type": "anime", "name": "Action" }, { "mal_id": 8, "name": "Drama" } ],
            "themes": [ { "mal_id": 38, "name": "Military" } ],
            "studios": [ { "mal_id": 4, "name": "Bones" } ]
        })
    }

    #[test]
    fn normalizes_a_complete_anime_payload() {
        let raw: ForeignAnime = serde_json::from_value(fmab_json()).unwrap();
        let normalized = normalize_anime(raw, observed()).unwrap();
        let anime = normalized.entity;

        assert!(normalized.warnings.is_empty(), "{:?}", normalized.warnings);
        assert_eq!(anime.mal_id, 5114);
        assert_eq!(anime.status, AnimeStatus::Finished);
        assert_eq!(anime.score, Some(9.1));
        assert_eq!(anime.season.as_deref(), Some("spring"));
        assert_eq!(anime.broadcast.day, BroadcastDay::Sundays);
        assert_eq!(anime.broadcast.time.as_deref(), Some("17:00"));
        assert_eq!(anime.genre_names().collect::<Vec<_>>(), vec!["Action", "Drama", "Military"]);
        assert_eq!(anime.studios, vec!["Bones"]);
        assert_eq!(anime.last_updated, observed());
    }

    #[test]
    fn sparse_payload_gets_defaults_and_warnings() {
        let raw: ForeignAnime = serde_json::from_value(serde_json::json!({
            "mal_id": 1,
            "titles": [ { "type": "Default", "title": "Cowboy Bebop" } ],
            "status": "On Hiatus",
            "score": 42.0,
            "members": -5,
            "broadcast": { "day": "Someday", "time": "late" },
            "genres": [ { "mal_id": 1 } ]
        }))
        .unwrap();

        let normalized = normalize_anime(raw, observed()).unwrap();
        let anime = &normalized.entity;
        assert_eq!(anime.title(), "Cowboy Bebop");
        assert_eq!(anime.status, AnimeStatus::Unknown);
        assert_eq!(anime.score, None);
        assert_eq!(anime.members, None);
        assert_eq!(anime.broadcast.day, BroadcastDay::Other);
        assert_eq!(anime.broadcast.time, None);
        assert!(anime.genres.is_empty());
        assert!(anime.images.is_empty());

        let fields: Vec<_> = normalized.warnings.iter().map(|w| w.field.as_str()).collect();
        for expected in ["status", "score", "members", "broadcast.day", "broadcast.time", "genres", "images"] {
            assert!(fields.contains(&expected), "missing warning for {expected}: {fields:?}");
        }
    }

    #[test]
    fn normalization_is_deterministic() {
        let raw: ForeignAnime = serde_json::from_value(fmab_json()).unwrap();
        let first = normalize_anime(raw.clone(), observed()).unwrap();
        let second = normalize_anime(raw, observed()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn payload_without_id_is_rejected() {
        let raw = ForeignAnime {
            title: Some("Nameless".into()),
            ..Default::default()
        };
        assert!(matches!(
            normalize_anime(raw, observed()),
            Err(UpstreamError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn character_skips_incomplete_nested_entries() {
        let raw: ForeignCharacter = serde_json::from_value(serde_json::json!({
            "mal_id": 11,
            "name": "Edward Elric",
            "name_kanji": "エドワード・エルリック",
            "nicknames": ["Fullmetal Alchemist", "Ed", "Ed"],
            "favorites": 80000,
            "images": { "jpg": { "image_url": "https://cdn.myanimelist.net/images/characters/9/72533.jpg" } },
            "anime": [
                { "role": "Main", "anime": { "mal_id": 5114, "title": "Fullmetal Alchemist: Brotherhood" } },
                { "role": "Main", "anime": { "title": "No id" } }
            ],
            "voices": [
                { "language": "Japanese", "person": { "mal_id": 15, "name": "Park, Romi" } },
                { "language": "English" }
            ]
        }))
        .unwrap();

        let normalized = normalize_character(raw, observed()).unwrap();
        let character = &normalized.entity;
        assert_eq!(character.nicknames, vec!["Fullmetal Alchemist", "Ed"]);
        assert_eq!(character.anime.len(), 1);
        assert_eq!(character.anime[0].mal_id, 5114);
        assert_eq!(character.voice_actors.len(), 1);
        assert_eq!(normalized.warnings.len(), 2);
    }
}
