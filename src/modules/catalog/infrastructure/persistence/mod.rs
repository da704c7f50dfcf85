pub mod memory_store;
pub mod models;
pub mod pg_store;

pub use memory_store::MemoryCatalogStore;
pub use pg_store::PgCatalogStore;
