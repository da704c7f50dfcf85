/// Scriptable upstream for resolver tests
///
/// Counts calls, can add latency and answers from a table keyed by
/// `(kind, id)`. Ids without an entry answer `NotFound`.
use async_trait::async_trait;
use miru_catalog::modules::catalog::domain::value_objects::{EntityKind, MalId};
use miru_catalog::modules::provider::domain::{ForeignPayload, MetadataProvider, UpstreamSearch};
use miru_catalog::shared::errors::{UpstreamError, UpstreamResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub struct FakeProvider {
    entities: Mutex<HashMap<(EntityKind, MalId), UpstreamResult<ForeignPayload>>>,
    search_results: Mutex<UpstreamResult<Vec<ForeignPayload>>>,
    latency: Duration,
    entity_calls: AtomicUsize,
    search_calls: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self {
            entities: Mutex::new(HashMap::new()),
            search_results: Mutex::new(Ok(Vec::new())),
            latency: Duration::ZERO,
            entity_calls: AtomicUsize::new(0),
            search_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_payload(self, payload: ForeignPayload) -> Self {
        self.set_payload(payload);
        self
    }

    pub fn set_payload(&self, payload: ForeignPayload) {
        let key = (payload.kind(), payload.mal_id().expect("fixture payload needs an id"));
        self.entities.lock().unwrap().insert(key, Ok(payload));
    }

    pub fn set_error(&self, kind: EntityKind, id: MalId, error: UpstreamError) {
        self.entities.lock().unwrap().insert((kind, id), Err(error));
    }

    pub fn set_search_results(&self, results: UpstreamResult<Vec<ForeignPayload>>) {
        *self.search_results.lock().unwrap() = results;
    }

    pub fn entity_calls(&self) -> usize {
        self.entity_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataProvider for FakeProvider {
    async fn get_entity(&self, kind: EntityKind, id: MalId) -> UpstreamResult<ForeignPayload> {
        self.entity_calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.entities
            .lock()
            .unwrap()
            .get(&(kind, id))
            .cloned()
            .unwrap_or_else(|| Err(UpstreamError::not_found(format!("{}/{}", kind, id))))
    }

    async fn search(
        &self,
        _kind: EntityKind,
        _search: &UpstreamSearch,
    ) -> UpstreamResult<Vec<ForeignPayload>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.search_results.lock().unwrap().clone()
    }

    fn name(&self) -> &str {
        "fake"
    }
}
