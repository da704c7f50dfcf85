pub mod domain;
pub mod infrastructure;

pub use domain::{DataIntegrityWarning, ForeignPayload, MetadataProvider, Normalized, UpstreamSearch};
pub use infrastructure::JikanProvider;
