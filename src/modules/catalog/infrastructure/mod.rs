pub mod cache;
pub mod persistence;

pub use cache::MemoryCacheStore;
pub use persistence::{MemoryCatalogStore, PgCatalogStore};
