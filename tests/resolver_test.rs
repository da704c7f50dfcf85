//! Resolver tests
//!
//! Exercises the cache → store → upstream → write-back path with an
//! in-memory cache, an in-memory store and a scripted upstream.

mod utils;

use miru_catalog::modules::catalog::application::{Resolution, ResolutionSource, ResolverConfig};
use miru_catalog::modules::catalog::domain::{CacheStore, CatalogStore, EntityKind};
use miru_catalog::modules::catalog::infrastructure::MemoryCatalogStore;
use miru_catalog::shared::errors::UpstreamError;
use std::sync::Arc;
use std::time::Duration;
use utils::factories::{
    build_resolver, build_resolver_with, foreign_anime, foreign_character, stored_anime,
};
use utils::fakes::FakeProvider;

#[tokio::test]
async fn test_end_to_end_resolution_survives_upstream_outage() {
    let provider = Arc::new(FakeProvider::new().with_payload(foreign_anime(5114, "FMA:B")));
    let tiers = build_resolver(MemoryCatalogStore::new(), provider.clone());

    let first = tiers
        .resolver
        .resolve_entity(EntityKind::Anime, 5114)
        .await
        .unwrap();
    assert_eq!(first.source(), Some(ResolutionSource::Upstream));

    let entity = first.entity().unwrap().clone();
    assert_eq!(entity.mal_id(), 5114);
    assert_eq!(entity.display_name(), "FMA:B");
    assert!(entity.as_anime().unwrap().has_genre("action"));

    // Written back to both tiers
    let stored = tiers
        .store
        .find_by_id(EntityKind::Anime, 5114)
        .await
        .unwrap();
    assert_eq!(stored.as_ref(), Some(&entity));
    assert!(tiers
        .cache
        .get(&EntityKind::Anime.cache_key(5114))
        .await
        .unwrap()
        .is_some());

    provider.set_error(
        EntityKind::Anime,
        5114,
        UpstreamError::Transport("connection refused".into()),
    );
    let second = tiers
        .resolver
        .resolve_entity(EntityKind::Anime, 5114)
        .await
        .unwrap();
    assert_eq!(second.source(), Some(ResolutionSource::Cache));
    assert_eq!(second.entity(), Some(&entity));
    assert_eq!(provider.entity_calls(), 1);
}

#[tokio::test]
async fn test_repeated_resolution_is_idempotent() {
    let provider = Arc::new(FakeProvider::new().with_payload(foreign_character(11, "Edward Elric")));
    let tiers = build_resolver(MemoryCatalogStore::new(), provider.clone());

    let first = tiers.resolver.resolve_character(11).await.unwrap().unwrap();
    let second = tiers.resolver.resolve_character(11).await.unwrap().unwrap();
    let third = tiers.resolver.resolve_character(11).await.unwrap().unwrap();

    assert_eq!(first, second);
    assert_eq!(second, third);
    assert_eq!(first.name, "Edward Elric");
    assert_eq!(provider.entity_calls(), 1);
    assert_eq!(tiers.store.len(), 1);
}

#[tokio::test]
async fn test_concurrent_misses_share_one_upstream_call() {
    let provider = Arc::new(
        FakeProvider::new()
            .with_latency(Duration::from_millis(100))
            .with_payload(foreign_anime(1, "Cowboy Bebop")),
    );
    let tiers = build_resolver(MemoryCatalogStore::new(), provider.clone());

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let resolver = Arc::clone(&tiers.resolver);
            tokio::spawn(async move { resolver.resolve_entity(EntityKind::Anime, 1).await })
        })
        .collect();

    for handle in handles {
        let resolution = handle.await.unwrap().unwrap();
        assert_eq!(resolution.entity().map(|e| e.mal_id()), Some(1));
    }

    assert_eq!(provider.entity_calls(), 1);
    assert_eq!(tiers.resolver.in_flight_count(), 0);
    assert_eq!(tiers.store.len(), 1);
}

#[tokio::test]
async fn test_store_hit_repopulates_cache_without_upstream() {
    let provider = Arc::new(FakeProvider::new());
    let tiers = build_resolver(
        MemoryCatalogStore::with_entities([stored_anime(30, "Monster")]),
        provider.clone(),
    );

    let first = tiers
        .resolver
        .resolve_entity(EntityKind::Anime, 30)
        .await
        .unwrap();
    assert_eq!(first.source(), Some(ResolutionSource::Store));

    let second = tiers
        .resolver
        .resolve_entity(EntityKind::Anime, 30)
        .await
        .unwrap();
    assert_eq!(second.source(), Some(ResolutionSource::Cache));
    assert_eq!(provider.entity_calls(), 0);
}

#[tokio::test]
async fn test_verified_absence_is_cached_negatively() {
    let provider = Arc::new(FakeProvider::new());
    let tiers = build_resolver(MemoryCatalogStore::new(), provider.clone());

    for _ in 0..3 {
        let resolution = tiers
            .resolver
            .resolve_entity(EntityKind::Anime, 999_999)
            .await
            .unwrap();
        assert_eq!(resolution, Resolution::NotFound);
    }

    assert_eq!(provider.entity_calls(), 1);
    assert!(tiers.store.is_empty());
}

#[tokio::test]
async fn test_negative_entry_expires() {
    let provider = Arc::new(FakeProvider::new());
    let config = ResolverConfig {
        not_found_ttl: Duration::from_millis(50),
        ..ResolverConfig::default()
    };
    let tiers = build_resolver_with(MemoryCatalogStore::new(), provider.clone(), config);

    assert_eq!(tiers.resolver.resolve_anime(42).await.unwrap(), None);

    tokio::time::sleep(Duration::from_millis(100)).await;
    provider.set_payload(foreign_anime(42, "Now Listed"));

    let anime = tiers.resolver.resolve_anime(42).await.unwrap().unwrap();
    assert_eq!(anime.mal_id, 42);
    assert_eq!(provider.entity_calls(), 2);
}

#[tokio::test]
async fn test_transient_failure_is_distinct_and_never_cached() {
    let provider = Arc::new(FakeProvider::new());
    provider.set_error(
        EntityKind::Anime,
        7,
        UpstreamError::RateLimited {
            retry_after: Some(Duration::from_secs(1)),
        },
    );
    let tiers = build_resolver(MemoryCatalogStore::new(), provider.clone());

    let resolution = tiers
        .resolver
        .resolve_entity(EntityKind::Anime, 7)
        .await
        .unwrap();
    match resolution {
        Resolution::Unavailable { reason } => assert!(reason.is_transient()),
        other => panic!("expected Unavailable, got {:?}", other),
    }
    assert_eq!(tiers.cache.stats().await.entries, 0);

    provider.set_payload(foreign_anime(7, "Recovered"));
    let retried = tiers
        .resolver
        .resolve_entity(EntityKind::Anime, 7)
        .await
        .unwrap();
    assert_eq!(retried.source(), Some(ResolutionSource::Upstream));
    assert_eq!(provider.entity_calls(), 2);
}

#[tokio::test]
async fn test_hung_upstream_times_out_and_frees_the_key() {
    let provider = Arc::new(
        FakeProvider::new()
            .with_latency(Duration::from_millis(500))
            .with_payload(foreign_anime(3, "Slow")),
    );
    let config = ResolverConfig {
        upstream_timeout: Duration::from_millis(50),
        ..ResolverConfig::default()
    };
    let tiers = build_resolver_with(MemoryCatalogStore::new(), provider.clone(), config);

    let resolution = tiers
        .resolver
        .resolve_entity(EntityKind::Anime, 3)
        .await
        .unwrap();
    assert!(matches!(
        resolution,
        Resolution::Unavailable {
            reason: UpstreamError::Timeout(_)
        }
    ));
    assert_eq!(tiers.resolver.in_flight_count(), 0);
    assert!(tiers.store.is_empty());
}

#[tokio::test]
async fn test_kind_mismatch_resolves_to_none() {
    let provider = Arc::new(FakeProvider::new().with_payload(foreign_anime(5, "Anime Five")));
    let tiers = build_resolver(MemoryCatalogStore::new(), provider);

    // Same id, other kind: the upstream has no character 5
    assert_eq!(tiers.resolver.resolve_character(5).await.unwrap(), None);
    assert!(tiers.resolver.resolve_anime(5).await.unwrap().is_some());
}

#[tokio::test]
async fn test_invalidate_forces_store_read() {
    let provider = Arc::new(FakeProvider::new().with_payload(foreign_anime(9, "Original")));
    let tiers = build_resolver(MemoryCatalogStore::new(), provider.clone());

    tiers.resolver.resolve_anime(9).await.unwrap();
    tiers.store.upsert(&stored_anime(9, "Edited")).await.unwrap();

    let cached = tiers.resolver.resolve_anime(9).await.unwrap().unwrap();
    assert_eq!(cached.title(), "Original");

    tiers
        .resolver
        .invalidate(EntityKind::Anime, 9)
        .await
        .unwrap();
    let fresh = tiers.resolver.resolve_anime(9).await.unwrap().unwrap();
    assert_eq!(fresh.title(), "Edited");
    assert_eq!(provider.entity_calls(), 1);

    let stats = tiers.resolver.cache_stats().await;
    assert!(stats.hits >= 1);
}
