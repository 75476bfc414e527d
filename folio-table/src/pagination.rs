//! Pagination metadata

use serde::Deserialize;
use serde::Serialize;

/// Default number of rows per page.
pub const DEFAULT_PER_PAGE: usize = 25;

/// Pagination metadata derived from the last successful fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Total number of items across all pages.
    pub total: usize,
    /// Items per page.
    pub per_page: usize,
    /// Number of pages, never less than 1.
    pub pages_num: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(0, DEFAULT_PER_PAGE)
    }
}

impl Pagination {
    /// Creates pagination metadata from a total and a page size.
    pub fn new(total: usize, per_page: usize) -> Self {
        let per_page = per_page.max(1);
        Self {
            total,
            per_page,
            pages_num: pages_for(total, per_page),
        }
    }

    /// Creates pagination metadata from a fetch response.
    ///
    /// `total` defaults to the number of returned rows and `per_page` to the
    /// page size that was requested.
    pub fn from_response(
        returned: usize,
        total: Option<usize>,
        per_page: Option<usize>,
        requested_per_page: usize,
    ) -> Self {
        Self::new(
            total.unwrap_or(returned),
            per_page.filter(|p| *p > 0).unwrap_or(requested_per_page),
        )
    }

    /// Returns `true` if a page after `page` exists.
    pub fn has_next(&self, page: usize) -> bool {
        page < self.pages_num
    }

    /// Returns `true` if a page before `page` exists.
    pub fn has_prev(&self, page: usize) -> bool {
        page > 1
    }

    /// Returns `true` if `page` is within `1..=pages_num`.
    pub fn contains(&self, page: usize) -> bool {
        (1..=self.pages_num).contains(&page)
    }
}

/// Number of pages needed for `total` items: `max(1, ceil(total / per_page))`.
pub fn pages_for(total: usize, per_page: usize) -> usize {
    total.div_ceil(per_page.max(1)).max(1)
}
