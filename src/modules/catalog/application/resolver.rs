//! Tiered entity resolution: cache → catalog store → upstream → write-back
//!
//! Upstream trouble never fails a call. It surfaces as
//! [`Resolution::NotFound`] (verified absence) or [`Resolution::Unavailable`]
//! (try again later), or simply as fewer search results. Cache and store
//! failures are infrastructure errors and are returned as `Err`.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::search::{SearchQuery, SearchResultSet};
use super::single_flight::SingleFlight;
use crate::modules::catalog::domain::{
    entities::{Anime, Character, Entity},
    repositories::{CacheStats, CacheStore, CatalogStore},
    value_objects::{EntityKind, MalId},
};
use crate::modules::catalog::infrastructure::cache::codec;
use crate::modules::provider::domain::{MetadataProvider, Normalized, UpstreamSearch};
use crate::modules::provider::infrastructure::jikan::normalize_payload;
use crate::shared::application::Paginated;
use crate::shared::config::CatalogConfig;
use crate::shared::errors::{AppResult, UpstreamError, UpstreamResult};
use crate::shared::utils::logger::{LogContext, TimedOperation};

/// Below this many store hits a text search asks the upstream for more
pub const SUPPLEMENT_THRESHOLD: usize = 5;

const ENTITY_PAYLOAD: &str = "entity";
const SEARCH_PAYLOAD: &str = "search";

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub entity_ttl: Duration,
    pub search_ttl: Duration,
    /// How long a verified upstream 404 is remembered
    pub not_found_ttl: Duration,
    pub upstream_timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            entity_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            search_ttl: Duration::from_secs(24 * 60 * 60),
            not_found_ttl: Duration::from_secs(10 * 60),
            upstream_timeout: Duration::from_secs(8),
        }
    }
}

impl From<&CatalogConfig> for ResolverConfig {
    fn from(config: &CatalogConfig) -> Self {
        Self {
            entity_ttl: config.entity_cache_ttl,
            search_ttl: config.search_cache_ttl,
            not_found_ttl: config.not_found_cache_ttl,
            upstream_timeout: config.upstream_timeout,
        }
    }
}

/// Tier that satisfied a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    Cache,
    Store,
    Upstream,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found {
        entity: Entity,
        source: ResolutionSource,
    },
    /// Absent locally and verified absent upstream
    NotFound,
    /// Absent locally; the upstream could not be asked (rate limit, timeout,
    /// network, bad payload). Worth retrying later.
    Unavailable { reason: UpstreamError },
}

impl Resolution {
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found { .. })
    }

    pub fn entity(&self) -> Option<&Entity> {
        match self {
            Resolution::Found { entity, .. } => Some(entity),
            _ => None,
        }
    }

    pub fn into_entity(self) -> Option<Entity> {
        match self {
            Resolution::Found { entity, .. } => Some(entity),
            _ => None,
        }
    }

    pub fn source(&self) -> Option<ResolutionSource> {
        match self {
            Resolution::Found { source, .. } => Some(*source),
            _ => None,
        }
    }
}

/// Cached single-entity value; `Missing` is a negative-cache tombstone
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "state", content = "entity", rename_all = "snake_case")]
enum CachedEntity {
    Present(Entity),
    Missing,
}

type FlightOutcome = AppResult<UpstreamResult<Entity>>;

/// The three tiers plus their policy; shared with spawned upstream work
struct Tiers {
    cache: Arc<dyn CacheStore>,
    store: Arc<dyn CatalogStore>,
    provider: Arc<dyn MetadataProvider>,
    config: ResolverConfig,
}

pub struct CatalogResolver {
    tiers: Arc<Tiers>,
    flights: SingleFlight<(EntityKind, MalId), FlightOutcome>,
}

impl CatalogResolver {
    pub fn new(
        cache: Arc<dyn CacheStore>,
        store: Arc<dyn CatalogStore>,
        provider: Arc<dyn MetadataProvider>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            tiers: Arc::new(Tiers {
                cache,
                store,
                provider,
                config,
            }),
            flights: SingleFlight::new(),
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.tiers.config
    }

    pub async fn resolve_entity(&self, kind: EntityKind, id: MalId) -> AppResult<Resolution> {
        let key = kind.cache_key(id);

        if let Some(bytes) = self.tiers.cache.get(&key).await? {
            match codec::decode::<CachedEntity>(ENTITY_PAYLOAD, &bytes) {
                Some(CachedEntity::Present(entity))
                    if entity.kind() == kind && entity.mal_id() == id =>
                {
                    return Ok(Resolution::Found {
                        entity,
                        source: ResolutionSource::Cache,
                    });
                }
                Some(CachedEntity::Missing) => {
                    log::debug!("Negative cache hit for {}", key);
                    return Ok(Resolution::NotFound);
                }
                _ => log::debug!("Ignoring unusable cache entry for {}", key),
            }
        }

        if let Some(entity) = self.tiers.store.find_by_id(kind, id).await? {
            self.tiers.cache_entity(&key, &entity).await?;
            return Ok(Resolution::Found {
                entity,
                source: ResolutionSource::Store,
            });
        }

        let tiers = Arc::clone(&self.tiers);
        let outcome = self
            .flights
            .run((kind, id), move || async move { tiers.fetch_and_write_back(kind, id).await })
            .await??;

        Ok(match outcome {
            Ok(entity) => Resolution::Found {
                entity,
                source: ResolutionSource::Upstream,
            },
            Err(e) if e.is_not_found() => Resolution::NotFound,
            Err(reason) => Resolution::Unavailable { reason },
        })
    }

    /// Anime by id; `None` covers both verified absence and upstream trouble
    pub async fn resolve_anime(&self, id: MalId) -> AppResult<Option<Anime>> {
        Ok(self
            .resolve_entity(EntityKind::Anime, id)
            .await?
            .into_entity()
            .and_then(Entity::into_anime))
    }

    pub async fn resolve_character(&self, id: MalId) -> AppResult<Option<Character>> {
        Ok(self
            .resolve_entity(EntityKind::Character, id)
            .await?
            .into_entity()
            .and_then(Entity::into_character))
    }

    /// Store-authoritative search, supplemented from upstream when sparse.
    ///
    /// Upstream results are never appended directly: they are written to the
    /// store and the original store query runs again, so ordering, filtering
    /// and deduplication stay the store's.
    pub async fn resolve_search(
        &self,
        kind: EntityKind,
        query: &SearchQuery,
    ) -> AppResult<SearchResultSet> {
        let key = query.cache_key(kind);
        if let Some(bytes) = self.tiers.cache.get(&key).await? {
            if let Some(cached) = codec::decode::<SearchResultSet>(SEARCH_PAYLOAD, &bytes) {
                return Ok(cached);
            }
        }

        let timer = TimedOperation::new("resolve_search");
        let store_query = query.store_query();
        let mut page = self.tiers.store.query(kind, &store_query).await?;
        let mut cacheable = true;

        if page.items.len() < SUPPLEMENT_THRESHOLD {
            if let Some(upstream_search) = query.upstream_search() {
                match self.tiers.supplement(kind, &upstream_search).await? {
                    Ok(0) => {}
                    Ok(written) => {
                        log::debug!("Supplemented {} {} records from upstream", written, kind);
                        page = self.tiers.store.query(kind, &store_query).await?;
                    }
                    Err(e) => {
                        log::warn!(
                            "Upstream search for '{}' failed, serving store results: {}",
                            upstream_search.text,
                            e
                        );
                        cacheable = false;
                    }
                }
            }
        }

        let result = Paginated::new(page.items, page.total, &query.pagination());
        if cacheable {
            let bytes = codec::encode(SEARCH_PAYLOAD, &result)?;
            self.tiers
                .cache
                .set(&key, bytes, self.tiers.config.search_ttl)
                .await?;
        }

        timer.finish_with_info(&format!("{} {} results", result.items.len(), kind));
        Ok(result)
    }

    /// Drop the cached value for one entity; the store keeps its record
    pub async fn invalidate(&self, kind: EntityKind, id: MalId) -> AppResult<()> {
        self.tiers.cache.remove(&kind.cache_key(id)).await
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.tiers.cache.stats().await
    }

    /// Upstream calls currently running
    pub fn in_flight_count(&self) -> usize {
        self.flights.in_flight_count()
    }
}

impl Tiers {
    async fn cache_entity(&self, key: &str, entity: &Entity) -> AppResult<()> {
        let bytes = codec::encode(ENTITY_PAYLOAD, &CachedEntity::Present(entity.clone()))?;
        self.cache.set(key, bytes, self.config.entity_ttl).await
    }

    async fn call_upstream<T, F>(&self, call: F) -> UpstreamResult<T>
    where
        F: std::future::Future<Output = UpstreamResult<T>>,
    {
        let limit = self.config.upstream_timeout;
        tokio::time::timeout(limit, call)
            .await
            .unwrap_or_else(|_| Err(UpstreamError::Timeout(limit)))
    }

    /// Upstream fetch, normalization and write-back for one entity. Runs as
    /// a single-flight task, so it completes even if every caller goes away.
    async fn fetch_and_write_back(&self, kind: EntityKind, id: MalId) -> FlightOutcome {
        let key = kind.cache_key(id);

        let payload = match self
            .call_upstream(self.provider.get_entity(kind, id))
            .await
        {
            Ok(payload) => payload,
            Err(e) if e.is_not_found() => {
                LogContext::resolution(kind.as_str(), id, "not found upstream");
                let tombstone = codec::encode(ENTITY_PAYLOAD, &CachedEntity::Missing)?;
                self.cache
                    .set(&key, tombstone, self.config.not_found_ttl)
                    .await?;
                return Ok(Err(e));
            }
            Err(e) => {
                log::warn!("Upstream lookup for {} {} failed: {}", kind, id, e);
                return Ok(Err(e));
            }
        };

        if payload.kind() != kind {
            return Ok(Err(UpstreamError::InvalidResponse {
                message: format!("expected {} payload, got {}", kind, payload.kind()),
            }));
        }

        let entity = match normalize_payload(payload, Utc::now()) {
            Ok(normalized) => log_warnings(kind, id, normalized),
            Err(e) => {
                log::warn!("Discarding upstream {} {}: {}", kind, id, e);
                return Ok(Err(e));
            }
        };

        if entity.mal_id() != id {
            log::warn!(
                "Upstream answered {} {} with id {}",
                kind,
                id,
                entity.mal_id()
            );
            return Ok(Err(UpstreamError::InvalidResponse {
                message: format!("requested id {}, received {}", id, entity.mal_id()),
            }));
        }

        self.store.upsert(&entity).await?;
        self.cache_entity(&key, &entity).await?;
        LogContext::resolution(kind.as_str(), id, "fetched from upstream and stored");
        Ok(Ok(entity))
    }

    /// One upstream search, normalized and bulk-upserted. Returns the number
    /// of records written; the outer error is infrastructure only.
    async fn supplement(
        &self,
        kind: EntityKind,
        search: &UpstreamSearch,
    ) -> AppResult<UpstreamResult<usize>> {
        let payloads = match self.call_upstream(self.provider.search(kind, search)).await {
            Ok(payloads) => payloads,
            Err(e) => return Ok(Err(e)),
        };

        let observed_at = Utc::now();
        let entities: Vec<Entity> = payloads
            .into_iter()
            .filter(|p| p.kind() == kind)
            .filter_map(|payload| {
                let id = payload.mal_id().unwrap_or_default();
                match normalize_payload(payload, observed_at) {
                    Ok(normalized) => Some(log_warnings(kind, id, normalized)),
                    Err(e) => {
                        log::warn!("Skipping upstream {} search result: {}", kind, e);
                        None
                    }
                }
            })
            .collect();

        if entities.is_empty() {
            return Ok(Ok(0));
        }

        let written = self.store.upsert_many(&entities).await?;
        // Fresh records must not be shadowed by older cache entries or tombstones
        for entity in &entities {
            self.cache.remove(&kind.cache_key(entity.mal_id())).await?;
        }
        Ok(Ok(written))
    }
}

fn log_warnings(kind: EntityKind, id: MalId, normalized: Normalized<Entity>) -> Entity {
    for warning in &normalized.warnings {
        log::warn!("Data integrity: {} {}: {}", kind, id, warning);
    }
    normalized.entity
}
