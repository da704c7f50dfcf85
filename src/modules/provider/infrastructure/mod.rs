pub mod http_client;
pub mod jikan;

pub use http_client::{RateLimitClient, RetryPolicy};
pub use jikan::JikanProvider;
