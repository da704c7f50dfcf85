pub mod application;
pub mod domain;
pub mod infrastructure;

// Re-exports for easy external access
pub use application::{
    CatalogResolver, Resolution, ResolutionSource, ResolverConfig, ScheduleEngine, ScheduleQuery,
    ScheduleResult, SearchQuery, SearchResultSet,
};
pub use domain::{Anime, CacheStore, CatalogStore, Character, Entity, EntityKind, MalId};
