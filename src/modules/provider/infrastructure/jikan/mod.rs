pub mod client;
pub mod mapper;
pub mod models;

pub use client::JikanProvider;
pub use mapper::{normalize_anime, normalize_character, normalize_payload};
