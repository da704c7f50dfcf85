/// Pagination support for queries
///
/// Standard pagination model shared by search and schedule listings
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Pagination parameters for queries (1-based pages)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaginationParams {
    pub page: u32,
    pub limit: u32,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PaginationParams {
    /// Out-of-range values are clamped instead of rejected
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_PAGE_LIMIT),
        }
    }

    /// Re-apply the clamp to values that bypassed `new` (deserialized input)
    pub fn clamped(&self) -> Self {
        Self::new(self.page, self.limit)
    }

    /// Calculate offset for store queries
    pub fn offset(&self) -> u64 {
        (self.page.max(1) as u64 - 1) * self.limit as u64
    }

    pub fn limit(&self) -> u64 {
        self.limit as u64
    }
}

/// Page metadata returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u32,
    /// Set when `total` was estimated rather than counted
    #[serde(default)]
    pub total_is_approximate: bool,
}

impl PageInfo {
    pub fn new(total: u64, params: &PaginationParams) -> Self {
        Self {
            page: params.page,
            limit: params.limit,
            total,
            pages: total_pages(total, params.limit),
            total_is_approximate: false,
        }
    }

    pub fn approximate(total: u64, params: &PaginationParams) -> Self {
        Self {
            total_is_approximate: true,
            ..Self::new(total, params)
        }
    }
}

fn total_pages(total: u64, limit: u32) -> u32 {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(limit as u64) as u32
}

/// Paginated result wrapper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: PageInfo,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: u64, params: &PaginationParams) -> Self {
        Self {
            items,
            pagination: PageInfo::new(total, params),
        }
    }

    pub fn empty(params: &PaginationParams) -> Self {
        Self::new(Vec::new(), 0, params)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
