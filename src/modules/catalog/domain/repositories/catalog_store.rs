use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::modules::catalog::domain::{
    entities::Entity,
    value_objects::{AnimeStatus, BroadcastDay, EntityKind, MalId},
};
use crate::shared::errors::AppResult;

/// Persistent, queryable home of normalized entities.
///
/// Upserts are keyed by `(kind, mal_id)` and replace the whole record, so
/// concurrent writers of the same id converge on last-writer-wins.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn find_by_id(&self, kind: EntityKind, id: MalId) -> AppResult<Option<Entity>>;

    async fn upsert(&self, entity: &Entity) -> AppResult<()>;

    /// Bulk upsert, idempotent per id. Returns the number of records written.
    async fn upsert_many(&self, entities: &[Entity]) -> AppResult<usize>;

    /// Filtered, sorted page plus the total count for the same filter
    async fn query(&self, kind: EntityKind, query: &CatalogQuery) -> AppResult<QueryPage>;
}

/// Store-side predicate. Anime-only predicates are ignored for characters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogFilter {
    /// Case-insensitive substring match over titles / names
    pub text: Option<String>,
    pub status: Option<AnimeStatus>,
    /// Every listed genre must be present
    pub genres: Vec<String>,
    /// Any listed day matches
    pub broadcast_days: Vec<BroadcastDay>,
    pub min_score: Option<f32>,
}

impl CatalogFilter {
    /// Trimmed free text, `None` when blank
    pub fn text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Case-insensitive pattern for the free text with regex metacharacters escaped
    pub fn text_regex(&self) -> Option<Regex> {
        self.text().and_then(|text| {
            RegexBuilder::new(&regex::escape(text))
                .case_insensitive(true)
                .build()
                .ok()
        })
    }

    /// Evaluate every predicate except free text
    pub fn matches_fields(&self, entity: &Entity) -> bool {
        let Entity::Anime(anime) = entity else {
            return true;
        };

        if let Some(status) = self.status {
            if anime.status != status {
                return false;
            }
        }
        if !self.genres.iter().all(|genre| anime.has_genre(genre)) {
            return false;
        }
        if !self.broadcast_days.is_empty() && !self.broadcast_days.contains(&anime.broadcast.day) {
            return false;
        }
        if let Some(min_score) = self.min_score {
            if anime.score.map_or(true, |score| score < min_score) {
                return false;
            }
        }
        true
    }

    pub fn matches(&self, entity: &Entity, text: Option<&Regex>) -> bool {
        let text_ok = text.map_or(true, |re| {
            entity.search_terms().iter().any(|term| re.is_match(term))
        });
        text_ok && self.matches_fields(entity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Score,
    /// Upstream popularity rank, 1 = most popular
    Popularity,
    Title,
    BroadcastTime,
    Favorites,
    LastUpdated,
    MalId,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Score => "score",
            SortKey::Popularity => "popularity",
            SortKey::Title => "title",
            SortKey::BroadcastTime => "broadcast_time",
            SortKey::Favorites => "favorites",
            SortKey::LastUpdated => "last_updated",
            SortKey::MalId => "mal_id",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    pub fn broadcast_time() -> Self {
        Self::new(SortKey::BroadcastTime, SortDirection::Asc)
    }
}

impl Default for SortSpec {
    fn default() -> Self {
        Self::new(SortKey::Score, SortDirection::Desc)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogQuery {
    pub filter: CatalogFilter,
    pub sort: SortSpec,
    pub skip: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPage {
    pub items: Vec<Entity>,
    /// Count of all records matching the filter, ignoring skip/limit
    pub total: u64,
}

/// Compare two optional values with missing values last in either direction
pub fn cmp_missing_last<T: PartialOrd>(
    a: Option<T>,
    b: Option<T>,
    direction: SortDirection,
) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => direction.apply(x.partial_cmp(&y).unwrap_or(Ordering::Equal)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Store ordering: the requested key, missing values last, then `mal_id`
/// ascending so equal keys never reorder between calls
pub fn compare_entities(a: &Entity, b: &Entity, sort: &SortSpec) -> Ordering {
    let direction = sort.direction;
    let primary = match sort.key {
        SortKey::Score => cmp_missing_last(
            a.as_anime().and_then(|x| x.score),
            b.as_anime().and_then(|x| x.score),
            direction,
        ),
        SortKey::Popularity => cmp_missing_last(
            a.as_anime().and_then(|x| x.popularity),
            b.as_anime().and_then(|x| x.popularity),
            direction,
        ),
        SortKey::Title => direction.apply(
            a.display_name()
                .to_lowercase()
                .cmp(&b.display_name().to_lowercase()),
        ),
        SortKey::BroadcastTime => cmp_missing_last(
            a.as_anime().and_then(|x| x.broadcast.time.as_deref()),
            b.as_anime().and_then(|x| x.broadcast.time.as_deref()),
            direction,
        ),
        SortKey::Favorites => cmp_missing_last(favorites(a), favorites(b), direction),
        SortKey::LastUpdated => direction.apply(a.last_updated().cmp(&b.last_updated())),
        SortKey::MalId => direction.apply(a.mal_id().cmp(&b.mal_id())),
    };

    primary.then_with(|| a.mal_id().cmp(&b.mal_id()))
}

fn favorites(entity: &Entity) -> Option<u32> {
    match entity {
        Entity::Anime(a) => a.favorites,
        Entity::Character(c) => c.favorites,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::catalog::domain::entities::{Anime, Character};
    use crate::modules::catalog::domain::value_objects::{BroadcastInfo, Genre};
    use chrono::Utc;

    fn anime(id: MalId, score: Option<f32>, time: Option<&str>) -> Entity {
        let mut anime = Anime::new(id, format!("Anime {}", id), Utc::now());
        anime.score = score;
        anime.broadcast = BroadcastInfo::new(BroadcastDay::Mondays, time);
        anime.genres = vec![Genre::new(1, "Action"), Genre::new(8, "Drama")];
        anime.status = AnimeStatus::Airing;
        Entity::Anime(anime)
    }

    #[test]
    fn missing_scores_sort_last_in_both_directions() {
        let mut items = vec![anime(1, None, None), anime(2, Some(7.0), None), anime(3, Some(9.0), None)];

        items.sort_by(|a, b| compare_entities(a, b, &SortSpec::new(SortKey::Score, SortDirection::Desc)));
        let ids: Vec<_> = items.iter().map(Entity::mal_id).collect();
        assert_eq!(ids, vec![3, 2, 1]);

        items.sort_by(|a, b| compare_entities(a, b, &SortSpec::new(SortKey::Score, SortDirection::Asc)));
        let ids: Vec<_> = items.iter().map(Entity::mal_id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn broadcast_time_ties_break_on_id() {
        let mut items = vec![
            anime(9, None, Some("23:30")),
            anime(4, None, None),
            anime(5, None, Some("23:30")),
            anime(6, None, Some("01:00")),
        ];
        items.sort_by(|a, b| compare_entities(a, b, &SortSpec::broadcast_time()));
        let ids: Vec<_> = items.iter().map(Entity::mal_id).collect();
        assert_eq!(ids, vec![6, 5, 9, 4]);
    }

    #[test]
    fn filter_requires_every_genre_and_escapes_text() {
        let entity = anime(1, Some(8.0), Some("12:00"));

        let filter = CatalogFilter {
            genres: vec!["action".into(), "DRAMA".into()],
            ..Default::default()
        };
        assert!(filter.matches_fields(&entity));

        let filter = CatalogFilter {
            genres: vec!["action".into(), "Comedy".into()],
            ..Default::default()
        };
        assert!(!filter.matches_fields(&entity));

        let filter = CatalogFilter {
            text: Some("anime (1".into()),
            ..Default::default()
        };
        let re = filter.text_regex().expect("escaped pattern compiles");
        assert!(!filter.matches(&entity, Some(&re)));
    }

    #[test]
    fn anime_predicates_do_not_apply_to_characters() {
        let character = Entity::Character(Character::new(40, "Edward Elric", Utc::now()));
        let filter = CatalogFilter {
            status: Some(AnimeStatus::Airing),
            min_score: Some(9.0),
            ..Default::default()
        };
        assert!(filter.matches_fields(&character));
    }
}
