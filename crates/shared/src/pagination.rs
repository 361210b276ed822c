//! Offset pagination utilities.

use serde::{Deserialize, Serialize};

/// A normalized offset/limit window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub offset: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Normalizes raw paging input.
    ///
    /// A missing limit becomes `default_limit`; any limit is clamped into
    /// `1..=max_limit`. Negative or missing offsets become zero.
    pub fn normalize(
        offset: Option<i64>,
        limit: Option<i64>,
        default_limit: i64,
        max_limit: i64,
    ) -> Self {
        let max_limit = max_limit.max(1);
        let limit = limit.unwrap_or(default_limit).clamp(1, max_limit);
        let offset = offset.unwrap_or(0).max(0);
        Self { offset, limit }
    }

    /// Offset of the page following this one.
    pub fn next_offset(&self) -> i64 {
        self.offset.saturating_add(self.limit)
    }
}

/// Pagination info returned alongside a page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub offset: i64,
    pub limit: i64,
    pub total: i64,
    pub has_next: bool,
}

impl PageInfo {
    pub fn new(page: PageRequest, total: i64) -> Self {
        Self {
            offset: page.offset,
            limit: page.limit,
            total,
            has_next: page.next_offset() < total,
        }
    }
}
