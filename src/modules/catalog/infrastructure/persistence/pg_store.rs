use async_trait::async_trait;
use diesel::dsl::sql;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::Text;
use std::sync::Arc;
use std::time::Instant;
use tokio::task;

use super::models::{entity_from_document, to_db_id, AnimeRow, CharacterRow};
use crate::modules::catalog::domain::{
    entities::Entity,
    repositories::{
        CatalogFilter, CatalogQuery, CatalogStore, QueryPage, SortDirection, SortKey, SortSpec,
    },
    value_objects::{EntityKind, MalId},
};
use crate::schema::{catalog_anime, catalog_characters};
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::logger::{LogContext, TimedOperation};
use crate::shared::Database;

/// Postgres-backed catalog store
pub struct PgCatalogStore {
    db: Arc<Database>,
}

impl PgCatalogStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

enum Row {
    Anime(AnimeRow),
    Character(CharacterRow),
}

impl Row {
    fn from_entity(entity: &Entity) -> AppResult<Self> {
        Ok(match entity {
            Entity::Anime(anime) => Row::Anime(AnimeRow::from_domain(anime)?),
            Entity::Character(character) => Row::Character(CharacterRow::from_domain(character)?),
        })
    }

    fn upsert(&self, conn: &mut PgConnection) -> AppResult<()> {
        match self {
            Row::Anime(row) => {
                diesel::insert_into(catalog_anime::table)
                    .values(row)
                    .on_conflict(catalog_anime::mal_id)
                    .do_update()
                    .set(row)
                    .execute(conn)?;
            }
            Row::Character(row) => {
                diesel::insert_into(catalog_characters::table)
                    .values(row)
                    .on_conflict(catalog_characters::mal_id)
                    .do_update()
                    .set(row)
                    .execute(conn)?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn find_by_id(&self, kind: EntityKind, id: MalId) -> AppResult<Option<Entity>> {
        let db = Arc::clone(&self.db);
        let db_id = to_db_id(id)?;
        let start = Instant::now();

        let document = task::spawn_blocking(move || -> AppResult<Option<serde_json::Value>> {
            let mut conn = db.get_connection()?;
            let document = match kind {
                EntityKind::Anime => catalog_anime::table
                    .find(db_id)
                    .select(catalog_anime::document)
                    .first::<serde_json::Value>(&mut conn)
                    .optional()?,
                EntityKind::Character => catalog_characters::table
                    .find(db_id)
                    .select(catalog_characters::document)
                    .first::<serde_json::Value>(&mut conn)
                    .optional()?,
            };
            Ok(document)
        })
        .await??;

        LogContext::db_operation("SELECT", table_name(kind), Some(elapsed_ms(start)));
        document.map(|d| entity_from_document(kind, d)).transpose()
    }

    async fn upsert(&self, entity: &Entity) -> AppResult<()> {
        let db = Arc::clone(&self.db);
        let row = Row::from_entity(entity)?;
        let kind = entity.kind();
        let start = Instant::now();

        task::spawn_blocking(move || -> AppResult<()> {
            let mut conn = db.get_connection()?;
            row.upsert(&mut conn)
        })
        .await??;

        LogContext::db_operation("UPSERT", table_name(kind), Some(elapsed_ms(start)));
        Ok(())
    }

    async fn upsert_many(&self, entities: &[Entity]) -> AppResult<usize> {
        if entities.is_empty() {
            return Ok(0);
        }

        let db = Arc::clone(&self.db);
        let rows = entities
            .iter()
            .map(Row::from_entity)
            .collect::<AppResult<Vec<_>>>()?;
        let timer = TimedOperation::new("catalog_upsert_many");

        let written = task::spawn_blocking(move || -> AppResult<usize> {
            let mut conn = db.get_connection()?;
            conn.transaction::<_, AppError, _>(|conn| {
                for row in &rows {
                    row.upsert(conn)?;
                }
                Ok(rows.len())
            })
        })
        .await??;

        timer.finish_with_info(&format!("{} records", written));
        Ok(written)
    }

    async fn query(&self, kind: EntityKind, query: &CatalogQuery) -> AppResult<QueryPage> {
        let db = Arc::clone(&self.db);
        let query = query.clone();
        let text = query.filter.text().unwrap_or_default().to_string();

        let (documents, total) =
            task::spawn_blocking(move || -> AppResult<(Vec<serde_json::Value>, i64)> {
                let mut conn = db.get_connection()?;
                let skip = i64::try_from(query.skip).unwrap_or(i64::MAX);
                let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);

                match kind {
                    EntityKind::Anime => {
                        let total = filter_anime(catalog_anime::table.into_boxed(), &query.filter)
                            .count()
                            .get_result::<i64>(&mut conn)?;
                        let page = filter_anime(
                            catalog_anime::table
                                .select(catalog_anime::document)
                                .into_boxed(),
                            &query.filter,
                        );
                        let documents = order_anime(page, &query.sort)
                            .offset(skip)
                            .limit(limit)
                            .load::<serde_json::Value>(&mut conn)?;
                        Ok((documents, total))
                    }
                    EntityKind::Character => {
                        let total =
                            filter_characters(catalog_characters::table.into_boxed(), &query.filter)
                                .count()
                                .get_result::<i64>(&mut conn)?;
                        let page = filter_characters(
                            catalog_characters::table
                                .select(catalog_characters::document)
                                .into_boxed(),
                            &query.filter,
                        );
                        let documents = order_characters(page, &query.sort)
                            .offset(skip)
                            .limit(limit)
                            .load::<serde_json::Value>(&mut conn)?;
                        Ok((documents, total))
                    }
                }
            })
            .await??;

        let items = documents
            .into_iter()
            .map(|d| entity_from_document(kind, d))
            .collect::<AppResult<Vec<_>>>()?;

        LogContext::search_operation(&text, Some(table_name(kind)), Some(items.len()));
        Ok(QueryPage {
            items,
            total: total.max(0) as u64,
        })
    }
}

fn table_name(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Anime => "catalog_anime",
        EntityKind::Character => "catalog_characters",
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// `ILIKE` pattern matching `text` anywhere, with wildcards in `text` escaped
fn like_pattern(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn filter_anime<'a, ST: 'a>(
    mut query: catalog_anime::BoxedQuery<'a, Pg, ST>,
    filter: &CatalogFilter,
) -> catalog_anime::BoxedQuery<'a, Pg, ST> {
    if let Some(text) = filter.text() {
        query = query.filter(catalog_anime::search_text.ilike(like_pattern(text)));
    }
    if let Some(status) = filter.status {
        query = query.filter(catalog_anime::status.eq(status));
    }
    if !filter.genres.is_empty() {
        let genres: Vec<String> = filter
            .genres
            .iter()
            .map(|g| g.trim().to_lowercase())
            .collect();
        query = query.filter(catalog_anime::genres.contains(genres));
    }
    if !filter.broadcast_days.is_empty() {
        let days: Vec<&'static str> = filter.broadcast_days.iter().map(|d| d.as_str()).collect();
        query = query.filter(catalog_anime::broadcast_day.eq_any(days));
    }
    if let Some(min_score) = filter.min_score {
        query = query.filter(catalog_anime::score.ge(min_score));
    }
    query
}

/// Missing values last, then `mal_id` ascending
fn order_anime<'a, ST: 'a>(
    query: catalog_anime::BoxedQuery<'a, Pg, ST>,
    sort: &SortSpec,
) -> catalog_anime::BoxedQuery<'a, Pg, ST> {
    use SortDirection::{Asc, Desc};

    let query = match (sort.key, sort.direction) {
        (SortKey::Score, Asc) => query.order(catalog_anime::score.asc().nulls_last()),
        (SortKey::Score, Desc) => query.order(catalog_anime::score.desc().nulls_last()),
        (SortKey::Popularity, Asc) => query.order(catalog_anime::popularity.asc().nulls_last()),
        (SortKey::Popularity, Desc) => query.order(catalog_anime::popularity.desc().nulls_last()),
        (SortKey::Favorites, Asc) => query.order(catalog_anime::favorites.asc().nulls_last()),
        (SortKey::Favorites, Desc) => query.order(catalog_anime::favorites.desc().nulls_last()),
        (SortKey::BroadcastTime, Asc) => {
            query.order(catalog_anime::broadcast_time.asc().nulls_last())
        }
        (SortKey::BroadcastTime, Desc) => {
            query.order(catalog_anime::broadcast_time.desc().nulls_last())
        }
        (SortKey::Title, Asc) => query.order(sql::<Text>("LOWER(title)").asc()),
        (SortKey::Title, Desc) => query.order(sql::<Text>("LOWER(title)").desc()),
        (SortKey::LastUpdated, Asc) => query.order(catalog_anime::last_updated.asc()),
        (SortKey::LastUpdated, Desc) => query.order(catalog_anime::last_updated.desc()),
        (SortKey::MalId, Asc) => query.order(catalog_anime::mal_id.asc()),
        (SortKey::MalId, Desc) => query.order(catalog_anime::mal_id.desc()),
    };
    query.then_order_by(catalog_anime::mal_id.asc())
}

/// Characters only support the free-text predicate
fn filter_characters<'a, ST: 'a>(
    mut query: catalog_characters::BoxedQuery<'a, Pg, ST>,
    filter: &CatalogFilter,
) -> catalog_characters::BoxedQuery<'a, Pg, ST> {
    if let Some(text) = filter.text() {
        query = query.filter(catalog_characters::search_text.ilike(like_pattern(text)));
    }
    query
}

/// Keys characters do not have fall back to id order
fn order_characters<'a, ST: 'a>(
    query: catalog_characters::BoxedQuery<'a, Pg, ST>,
    sort: &SortSpec,
) -> catalog_characters::BoxedQuery<'a, Pg, ST> {
    use SortDirection::{Asc, Desc};

    let query = match (sort.key, sort.direction) {
        (SortKey::Favorites, Asc) => query.order(catalog_characters::favorites.asc().nulls_last()),
        (SortKey::Favorites, Desc) => {
            query.order(catalog_characters::favorites.desc().nulls_last())
        }
        (SortKey::Title, Asc) => query.order(sql::<Text>("LOWER(name)").asc()),
        (SortKey::Title, Desc) => query.order(sql::<Text>("LOWER(name)").desc()),
        (SortKey::LastUpdated, Asc) => query.order(catalog_characters::last_updated.asc()),
        (SortKey::LastUpdated, Desc) => query.order(catalog_characters::last_updated.desc()),
        (SortKey::MalId, Desc) => query.order(catalog_characters::mal_id.desc()),
        _ => query.order(catalog_characters::mal_id.asc()),
    };
    query.then_order_by(catalog_characters::mal_id.asc())
}
