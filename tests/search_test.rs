//! Search supplementation tests
//!
//! The upstream is a mockall double so each test states exactly how many
//! upstream searches it expects.

mod utils;

use async_trait::async_trait;
use mockall::mock;
use mockall::predicate::eq;
use miru_catalog::modules::catalog::application::SearchQuery;
use miru_catalog::modules::catalog::domain::{CatalogStore, EntityKind, MalId};
use miru_catalog::modules::catalog::infrastructure::MemoryCatalogStore;
use miru_catalog::modules::provider::domain::{ForeignPayload, MetadataProvider, UpstreamSearch};
use miru_catalog::shared::errors::{UpstreamError, UpstreamResult};
use std::sync::Arc;
use std::time::Duration;
use utils::factories::{build_resolver, foreign_anime, stored_anime};

mock! {
    pub Upstream {}

    #[async_trait]
    impl MetadataProvider for Upstream {
        async fn get_entity(&self, kind: EntityKind, id: MalId) -> UpstreamResult<ForeignPayload>;
        async fn search(
            &self,
            kind: EntityKind,
            search: &UpstreamSearch,
        ) -> UpstreamResult<Vec<ForeignPayload>>;
    }
}

fn gundam_store(count: u32) -> MemoryCatalogStore {
    MemoryCatalogStore::with_entities(
        (1..=count).map(|id| stored_anime(id, &format!("Mobile Suit Gundam {}", id))),
    )
}

#[tokio::test]
async fn test_enough_local_results_skip_upstream() {
    let mut upstream = MockUpstream::new();
    upstream.expect_search().times(0);
    upstream.expect_get_entity().times(0);

    let tiers = build_resolver(gundam_store(6), Arc::new(upstream));
    let result = tiers
        .resolver
        .resolve_search(EntityKind::Anime, &SearchQuery::text("gundam"))
        .await
        .unwrap();

    assert_eq!(result.items.len(), 6);
    assert_eq!(result.pagination.total, 6);
}

#[tokio::test]
async fn test_sparse_results_are_supplemented_through_the_store() {
    let mut upstream = MockUpstream::new();
    upstream
        .expect_search()
        .withf(|kind, search| *kind == EntityKind::Anime && search.text == "gundam")
        .times(1)
        .returning(|_, _| {
            Ok(vec![
                foreign_anime(100, "Gundam Wing"),
                foreign_anime(101, "Gundam 00"),
                // Not a text match: written to the store but filtered out
                foreign_anime(102, "Code Geass"),
            ])
        });

    let tiers = build_resolver(gundam_store(2), Arc::new(upstream));
    let result = tiers
        .resolver
        .resolve_search(EntityKind::Anime, &SearchQuery::text("gundam"))
        .await
        .unwrap();

    let mut ids: Vec<_> = result.items.iter().map(|e| e.mal_id()).collect();
    ids.sort();
    assert_eq!(ids, vec![1, 2, 100, 101]);
    assert_eq!(result.pagination.total, 4);
    assert_eq!(tiers.store.len(), 5);
    assert!(tiers
        .store
        .find_by_id(EntityKind::Anime, 102)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_search_results_are_cached() {
    let mut upstream = MockUpstream::new();
    upstream
        .expect_search()
        .times(1)
        .returning(|_, _| Ok(vec![foreign_anime(7, "Gundam X")]));

    let tiers = build_resolver(MemoryCatalogStore::new(), Arc::new(upstream));
    let query = SearchQuery::text("Gundam");

    let first = tiers
        .resolver
        .resolve_search(EntityKind::Anime, &query)
        .await
        .unwrap();
    // Equivalent text shares the cache entry
    let second = tiers
        .resolver
        .resolve_search(EntityKind::Anime, &SearchQuery::text("  gundam "))
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(first.items.len(), 1);
}

#[tokio::test]
async fn test_upstream_search_failure_serves_store_results_uncached() {
    let mut upstream = MockUpstream::new();
    upstream
        .expect_search()
        .times(2)
        .returning(|_, _| {
            Err(UpstreamError::RateLimited {
                retry_after: Some(Duration::from_secs(1)),
            })
        });

    let tiers = build_resolver(gundam_store(1), Arc::new(upstream));
    let query = SearchQuery::text("gundam");

    for _ in 0..2 {
        let result = tiers
            .resolver
            .resolve_search(EntityKind::Anime, &query)
            .await
            .unwrap();
        assert_eq!(result.items.len(), 1);
    }
}

#[tokio::test]
async fn test_browse_without_text_never_searches_upstream() {
    let mut upstream = MockUpstream::new();
    upstream.expect_search().times(0);

    let tiers = build_resolver(gundam_store(2), Arc::new(upstream));
    let result = tiers
        .resolver
        .resolve_search(EntityKind::Anime, &SearchQuery::default())
        .await
        .unwrap();
    assert_eq!(result.items.len(), 2);
}

#[tokio::test]
async fn test_supplement_clears_stale_entity_entries() {
    let mut upstream = MockUpstream::new();
    upstream
        .expect_get_entity()
        .with(eq(EntityKind::Anime), eq(55))
        .times(1)
        .returning(|_, id| Err(UpstreamError::not_found(format!("anime/{}", id))));
    upstream
        .expect_search()
        .times(1)
        .returning(|_, _| Ok(vec![foreign_anime(55, "Gundam Unicorn")]));

    let tiers = build_resolver(MemoryCatalogStore::new(), Arc::new(upstream));

    // Tombstone from an earlier miss
    assert_eq!(tiers.resolver.resolve_anime(55).await.unwrap(), None);

    tiers
        .resolver
        .resolve_search(EntityKind::Anime, &SearchQuery::text("unicorn"))
        .await
        .unwrap();

    let anime = tiers.resolver.resolve_anime(55).await.unwrap().unwrap();
    assert_eq!(anime.title(), "Gundam Unicorn");
}

#[tokio::test]
async fn test_blank_genre_does_not_poison_the_unfiltered_search() {
    let mut upstream = MockUpstream::new();
    upstream.expect_search().times(0);

    let tiers = build_resolver(gundam_store(6), Arc::new(upstream));
    let blank_genre = SearchQuery {
        genres: vec!["  ".into()],
        ..SearchQuery::text("gundam")
    };

    let filtered = tiers
        .resolver
        .resolve_search(EntityKind::Anime, &blank_genre)
        .await
        .unwrap();
    let plain = tiers
        .resolver
        .resolve_search(EntityKind::Anime, &SearchQuery::text("gundam"))
        .await
        .unwrap();

    assert_eq!(filtered.items.len(), 6);
    assert_eq!(plain.items.len(), 6);
    assert_eq!(plain.pagination.total, 6);
}
