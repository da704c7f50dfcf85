use serde::{Deserialize, Serialize};

use crate::modules::catalog::domain::{
    entities::Entity,
    repositories::{CatalogFilter, CatalogQuery, SortSpec},
    value_objects::{AnimeStatus, BroadcastDay, EntityKind},
};
use crate::modules::provider::domain::UpstreamSearch;
use crate::shared::application::{Paginated, PaginationParams};

/// Result-set returned by searches
pub type SearchResultSet = Paginated<Entity>;

/// Catalog search request as issued by controllers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: Option<String>,
    pub status: Option<AnimeStatus>,
    pub genres: Vec<String>,
    pub broadcast_days: Vec<BroadcastDay>,
    pub min_score: Option<f32>,
    pub sort: SortSpec,
    pub pagination: PaginationParams,
}

impl SearchQuery {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn with_page(mut self, page: u32, limit: u32) -> Self {
        self.pagination = PaginationParams::new(page, limit);
        self
    }

    /// Pagination with page and limit clamped to the accepted range
    pub fn pagination(&self) -> PaginationParams {
        self.pagination.clamped()
    }

    /// Trimmed, lowercased, deduplicated genres; blanks are dropped
    pub fn normalized_genres(&self) -> Vec<String> {
        normalize_genres(&self.genres)
    }

    pub fn filter(&self) -> CatalogFilter {
        CatalogFilter {
            text: self.text.clone(),
            status: self.status,
            genres: self.normalized_genres(),
            broadcast_days: self.broadcast_days.clone(),
            min_score: self.min_score,
        }
    }

    pub fn store_query(&self) -> CatalogQuery {
        let pagination = self.pagination();
        CatalogQuery {
            filter: self.filter(),
            sort: self.sort,
            skip: pagination.offset(),
            limit: pagination.limit(),
        }
    }

    /// Free text worth sending upstream, if any
    pub fn upstream_search(&self) -> Option<UpstreamSearch> {
        let text = self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())?;
        Some(UpstreamSearch {
            text: text.to_string(),
            status: self.status,
            genres: self.normalized_genres(),
            page: 1,
            limit: self.pagination().limit.max(super::resolver::SUPPLEMENT_THRESHOLD as u32),
        })
    }

    /// Cache key covering every field that affects the result set.
    ///
    /// Equivalent queries map to the same key: text is trimmed and
    /// lowercased, genres and days are order-insensitive. Genres and
    /// pagination go through the same normalization as the store query.
    pub fn cache_key(&self, kind: EntityKind) -> String {
        let text = self
            .text
            .as_deref()
            .map(|t| t.trim().to_lowercase())
            .unwrap_or_default();

        let genres = self.normalized_genres();
        let pagination = self.pagination();

        let mut days: Vec<BroadcastDay> = self.broadcast_days.clone();
        days.sort();
        days.dedup();
        let days: Vec<&str> = days.iter().map(|d| d.as_str()).collect();

        format!(
            "search:{}:q={}|status={}|genres={}|days={}|min={}|sort={}.{}|page={}|limit={}",
            kind.as_str(),
            urlencoding::encode(&text),
            self.status.map(|s| s.as_key()).unwrap_or("-"),
            genres.join(","),
            days.join(","),
            self.min_score
                .map(|s| format!("{:08x}", s.to_bits()))
                .unwrap_or_else(|| "-".to_string()),
            self.sort.key.as_str(),
            self.sort.direction.as_str(),
            pagination.page,
            pagination.limit
        )
    }
}

/// Sorted so that equivalent genre lists compare equal
pub(crate) fn normalize_genres(genres: &[String]) -> Vec<String> {
    let mut genres: Vec<String> = genres
        .iter()
        .map(|g| g.trim().to_lowercase())
        .filter(|g| !g.is_empty())
        .collect();
    genres.sort();
    genres.dedup();
    genres
}
