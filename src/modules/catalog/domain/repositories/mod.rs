pub mod cache_store;
pub mod catalog_store;

pub use cache_store::{CacheStats, CacheStore};
pub use catalog_store::{
    cmp_missing_last, compare_entities, CatalogFilter, CatalogQuery, CatalogStore, QueryPage,
    SortDirection, SortKey, SortSpec,
};
