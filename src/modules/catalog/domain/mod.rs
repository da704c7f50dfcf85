pub mod entities;
pub mod repositories;
pub mod value_objects;

pub use entities::{Anime, Character, Entity};
pub use repositories::{CacheStore, CatalogStore};
pub use value_objects::{AnimeStatus, BroadcastDay, BroadcastInfo, EntityKind, MalId};
