pub mod anime_status;
pub mod broadcast;
pub mod entity_kind;
pub mod media;

pub use anime_status::AnimeStatus;
pub use broadcast::{BroadcastDay, BroadcastInfo, LocalBroadcast, SOURCE_TIMEZONE};
pub use entity_kind::{EntityKind, MalId};
pub use media::{Genre, ImageSet};
