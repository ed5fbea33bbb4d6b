//! Shared DTO types used across multiple endpoints.

use serde::Serialize;
use utoipa::ToSchema;

/// Default page size for list endpoints.
pub const DEFAULT_PER_PAGE: u32 = 20;

/// Largest accepted page size.
pub const MAX_PER_PAGE: u32 = 100;

/// Pagination metadata included in list responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginationMeta {
    /// Current page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Total number of items.
    pub total: u32,
    /// Total number of pages.
    pub total_pages: u32,
}

/// A validated page request. `page` is 1-indexed and clamped to at least
/// 1; `per_page` is clamped to `1..=MAX_PER_PAGE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Requested page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
}

impl PageRequest {
    /// Applies defaults and bounds to the raw query parameters.
    #[must_use]
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE),
        }
    }

    /// Number of items before this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }

    /// Maximum number of items on this page.
    #[must_use]
    pub fn limit(&self) -> u64 {
        u64::from(self.per_page)
    }

    /// Builds the response metadata for `total` matching items.
    #[must_use]
    pub fn meta(&self, total: u64) -> PaginationMeta {
        let total = u32::try_from(total).unwrap_or(u32::MAX);
        PaginationMeta {
            page: self.page,
            per_page: self.per_page,
            total,
            total_pages: total.div_ceil(self.per_page),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_bounds() {
        let first = PageRequest::new(None, None);
        assert_eq!((first.offset(), first.limit()), (0, 20));

        let third = PageRequest::new(Some(3), None);
        assert_eq!(third.offset(), 40);
        let meta = third.meta(45);
        assert_eq!((meta.total, meta.total_pages), (45, 3));

        let clamped = PageRequest::new(Some(0), Some(500));
        assert_eq!(clamped.page, 1);
        assert_eq!(clamped.per_page, MAX_PER_PAGE);
        assert_eq!(PageRequest::new(None, Some(0)).per_page, 1);
    }

    #[test]
    fn empty_list_has_no_pages() {
        let meta = PageRequest::new(Some(2), Some(10)).meta(0);
        assert_eq!(meta.total_pages, 0);
        assert_eq!(meta.page, 2);
    }
}
