/// Test data factories with sensible defaults
use chrono::Utc;
use miru_catalog::modules::catalog::application::{CatalogResolver, ResolverConfig};
use miru_catalog::modules::catalog::domain::{
    entities::{Anime, Entity},
    value_objects::{BroadcastDay, BroadcastInfo, MalId},
    CacheStore, CatalogStore,
};
use miru_catalog::modules::catalog::infrastructure::{MemoryCacheStore, MemoryCatalogStore};
use miru_catalog::modules::provider::domain::{
    entities::{ForeignAnime, ForeignBroadcast, ForeignCharacter, ForeignRef},
    ForeignPayload, MetadataProvider,
};
use std::sync::Arc;

/// Upstream anime payload shaped like a Jikan `/anime/{id}/full` body
pub fn foreign_anime(id: MalId, title: &str) -> ForeignPayload {
    ForeignPayload::Anime(ForeignAnime {
        mal_id: Some(id),
        title: Some(title.to_string()),
        status: Some("Finished Airing".to_string()),
        score: Some(9.1),
        episodes: Some(64),
        genres: Some(vec![
            ForeignRef {
                mal_id: Some(1),
                name: Some("Action".to_string()),
                ..Default::default()
            },
            ForeignRef {
                mal_id: Some(8),
                name: Some("Drama".to_string()),
                ..Default::default()
            },
        ]),
        broadcast: Some(ForeignBroadcast {
            day: Some("Sundays".to_string()),
            time: Some("17:00".to_string()),
            timezone: Some("Asia/Tokyo".to_string()),
            string: None,
        }),
        ..Default::default()
    })
}

pub fn foreign_character(id: MalId, name: &str) -> ForeignPayload {
    ForeignPayload::Character(ForeignCharacter {
        mal_id: Some(id),
        name: Some(name.to_string()),
        ..Default::default()
    })
}

/// Already-normalized anime as the store would hold it
pub fn stored_anime(id: MalId, title: &str) -> Entity {
    Entity::Anime(Anime::new(id, title, Utc::now()))
}

pub fn broadcasting_anime(id: MalId, day: BroadcastDay, time: Option<&str>) -> Entity {
    let mut anime = Anime::new(id, format!("Show {}", id), Utc::now());
    anime.broadcast = BroadcastInfo::new(day, time);
    Entity::Anime(anime)
}

pub struct TestTiers {
    pub resolver: Arc<CatalogResolver>,
    pub cache: Arc<MemoryCacheStore>,
    pub store: Arc<MemoryCatalogStore>,
}

pub fn build_resolver(store: MemoryCatalogStore, provider: Arc<dyn MetadataProvider>) -> TestTiers {
    build_resolver_with(store, provider, ResolverConfig::default())
}

pub fn build_resolver_with(
    store: MemoryCatalogStore,
    provider: Arc<dyn MetadataProvider>,
    config: ResolverConfig,
) -> TestTiers {
    let cache = Arc::new(MemoryCacheStore::new(1_000));
    let store = Arc::new(store);
    let resolver = Arc::new(CatalogResolver::new(
        cache.clone() as Arc<dyn CacheStore>,
        store.clone() as Arc<dyn CatalogStore>,
        provider,
        config,
    ));
    TestTiers {
        resolver,
        cache,
        store,
    }
}
