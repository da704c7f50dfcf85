pub mod entities;
pub mod repositories;
pub mod value_objects;

pub use entities::ForeignPayload;
pub use repositories::MetadataProvider;
pub use value_objects::{DataIntegrityWarning, Normalized, UpstreamSearch};
