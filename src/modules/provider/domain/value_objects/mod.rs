pub mod data_integrity;
pub mod upstream_search;

pub use data_integrity::{DataIntegrityWarning, Normalized};
pub use upstream_search::UpstreamSearch;
