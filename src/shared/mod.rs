// Shared kernel: errors, configuration, logging, pagination and the database pool

pub mod application;
pub mod config;
pub mod errors;
pub mod infrastructure;
pub mod utils;

pub use config::CatalogConfig;
pub use infrastructure::database::Database;
