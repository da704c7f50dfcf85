pub mod resolver;
pub mod schedule;
pub mod search;
pub mod single_flight;

pub use resolver::{CatalogResolver, Resolution, ResolutionSource, ResolverConfig};
pub use schedule::{
    convert_broadcast, convert_broadcast_at, ScheduleConfig, ScheduleEngine, ScheduleItem,
    ScheduleQuery, ScheduleResult,
};
pub use search::{SearchQuery, SearchResultSet};
pub use single_flight::SingleFlight;
