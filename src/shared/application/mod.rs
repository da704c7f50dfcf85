pub mod pagination;

pub use pagination::{PageInfo, Paginated, PaginationParams};
