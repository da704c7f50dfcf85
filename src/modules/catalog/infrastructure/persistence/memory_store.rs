use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::modules::catalog::domain::{
    entities::Entity,
    repositories::{compare_entities, CatalogQuery, CatalogStore, QueryPage},
    value_objects::{EntityKind, MalId},
};
use crate::shared::errors::{AppError, AppResult};

/// Catalog store held entirely in process memory.
///
/// Used when no database is configured and by tests. Query semantics match
/// the Postgres store: same filter predicates, same ordering, same totals.
#[derive(Debug, Default)]
pub struct MemoryCatalogStore {
    records: RwLock<BTreeMap<(EntityKind, MalId), Entity>>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entities(entities: impl IntoIterator<Item = Entity>) -> Self {
        let records = entities
            .into_iter()
            .map(|e| ((e.kind(), e.mal_id()), e))
            .collect();
        Self {
            records: RwLock::new(records),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn poisoned() -> AppError {
        AppError::InternalError("Catalog store lock poisoned".to_string())
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn find_by_id(&self, kind: EntityKind, id: MalId) -> AppResult<Option<Entity>> {
        let records = self.records.read().map_err(|_| Self::poisoned())?;
        Ok(records.get(&(kind, id)).cloned())
    }

    async fn upsert(&self, entity: &Entity) -> AppResult<()> {
        let mut records = self.records.write().map_err(|_| Self::poisoned())?;
        records.insert((entity.kind(), entity.mal_id()), entity.clone());
        Ok(())
    }

    async fn upsert_many(&self, entities: &[Entity]) -> AppResult<usize> {
        let mut records = self.records.write().map_err(|_| Self::poisoned())?;
        for entity in entities {
            records.insert((entity.kind(), entity.mal_id()), entity.clone());
        }
        Ok(entities.len())
    }

    async fn query(&self, kind: EntityKind, query: &CatalogQuery) -> AppResult<QueryPage> {
        let text = query.filter.text_regex();
        let records = self.records.read().map_err(|_| Self::poisoned())?;

        let mut matching: Vec<&Entity> = records
            .values()
            .filter(|e| e.kind() == kind)
            .filter(|e| query.filter.matches(e, text.as_ref()))
            .collect();
        matching.sort_by(|a, b| compare_entities(a, b, &query.sort));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(query.skip as usize)
            .take(query.limit as usize)
            .cloned()
            .collect();

        Ok(QueryPage { items, total })
    }
}
