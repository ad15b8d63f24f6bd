//! Pagination types for repository queries
//!
//! [`Page`] controls result windowing at the SQL level; [`PaginatedResult`]
//! wraps a page of rows together with the metadata clients use to render
//! page controls.

use serde::Serialize;
use sqlx::{Postgres, QueryBuilder};

/// Result windowing parameters
///
/// Both fields are optional: an absent `skip` starts at the first row, an
/// absent `limit` returns everything after the skip point.
///
/// # Example
///
/// ```rust
/// use registra::repo::Page;
///
/// let all = Page::all();
/// assert_eq!(all.skip, None);
/// assert_eq!(all.limit, None);
///
/// let window = Page::window(40, 20);
/// assert_eq!(window.skip, Some(40));
/// assert_eq!(window.limit, Some(20));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Page {
    /// Number of rows to skip
    pub skip: Option<i64>,
    /// Maximum number of rows to return
    pub limit: Option<i64>,
}

impl Page {
    /// Create windowing parameters from optional parts
    #[must_use]
    pub const fn new(skip: Option<i64>, limit: Option<i64>) -> Self {
        Self { skip, limit }
    }

    /// No windowing: return every matching row
    #[must_use]
    pub const fn all() -> Self {
        Self {
            skip: None,
            limit: None,
        }
    }

    /// Skip `skip` rows and return at most `limit`
    #[must_use]
    pub const fn window(skip: i64, limit: i64) -> Self {
        Self {
            skip: Some(skip),
            limit: Some(limit),
        }
    }

    /// Append `LIMIT`/`OFFSET` clauses for whichever parts are present
    pub fn push_sql(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        if let Some(limit) = self.limit {
            qb.push(" LIMIT ");
            qb.push_bind(limit);
        }
        if let Some(skip) = self.skip {
            qb.push(" OFFSET ");
            qb.push_bind(skip);
        }
    }
}

/// A page of rows plus the metadata describing its position
///
/// The metadata math is fixed: `page_number` is derived from the skip that
/// produced the page, and `total_pages` is `total_items / page_size + 1`,
/// except that an empty result set reports page zero of zero.
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResult<T> {
    /// 1-indexed page this window corresponds to (0 when there are no items)
    pub page_number: i64,
    /// Requested page size
    pub page_size: i64,
    /// Total rows matching the query across all pages
    pub total_items: i64,
    /// Total page count (0 when there are no items)
    pub total_pages: i64,
    /// The rows in this window
    pub items: Vec<T>,
}

impl<T> PaginatedResult<T> {
    /// Assemble a page from a window of rows and the matching total
    ///
    /// `limit` must be positive; callers fall back to the configured default
    /// page size before reaching this point.
    pub fn new(total_items: i64, skip: Option<i64>, limit: i64, items: Vec<T>) -> Self {
        debug_assert!(limit > 0);
        if total_items == 0 {
            return Self {
                page_number: 0,
                page_size: limit,
                total_items: 0,
                total_pages: 0,
                items,
            };
        }
        let page_number = match skip {
            Some(skip) => skip / limit + 1,
            None => 1,
        };
        let total_pages = total_items / limit + 1;
        Self {
            page_number,
            page_size: limit,
            total_items,
            total_pages,
            items,
        }
    }

    /// Map the items while keeping the page metadata intact
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResult<U> {
        PaginatedResult {
            page_number: self.page_number,
            page_size: self.page_size,
            total_items: self.total_items,
            total_pages: self.total_pages,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_all_is_default() {
        assert_eq!(Page::all(), Page::default());
    }

    #[test]
    fn test_page_push_sql_limit_and_offset() {
        let mut qb = QueryBuilder::new("SELECT * FROM school");
        Page::window(40, 20).push_sql(&mut qb);
        assert_eq!(qb.sql(), "SELECT * FROM school LIMIT $1 OFFSET $2");
    }

    #[test]
    fn test_page_push_sql_limit_only() {
        let mut qb = QueryBuilder::new("SELECT * FROM school");
        Page::new(None, Some(10)).push_sql(&mut qb);
        assert_eq!(qb.sql(), "SELECT * FROM school LIMIT $1");
    }

    #[test]
    fn test_page_push_sql_none() {
        let mut qb = QueryBuilder::new("SELECT * FROM school");
        Page::all().push_sql(&mut qb);
        assert_eq!(qb.sql(), "SELECT * FROM school");
    }

    #[test]
    fn test_paginated_first_page_without_skip() {
        let page = PaginatedResult::new(45, None, 10, vec![1, 2, 3]);
        assert_eq!(page.page_number, 1);
        assert_eq!(page.page_size, 10);
        assert_eq!(page.total_items, 45);
        assert_eq!(page.total_pages, 5);
    }

    #[test]
    fn test_paginated_page_number_from_skip() {
        let page = PaginatedResult::new(45, Some(20), 10, Vec::<i32>::new());
        assert_eq!(page.page_number, 3);
    }

    #[test]
    fn test_paginated_partial_skip_floors() {
        // A skip that is not a whole number of pages still floors.
        let page = PaginatedResult::new(45, Some(25), 10, Vec::<i32>::new());
        assert_eq!(page.page_number, 3);
    }

    #[test]
    fn test_paginated_exact_multiple_total() {
        // 40 items at 10 per page reports 5 total pages: the formula is
        // floor(total / limit) + 1, not a ceiling division.
        let page = PaginatedResult::new(40, None, 10, Vec::<i32>::new());
        assert_eq!(page.total_pages, 5);
    }

    #[test]
    fn test_paginated_empty_result_is_page_zero_of_zero() {
        let page = PaginatedResult::new(0, Some(20), 10, Vec::<i32>::new());
        assert_eq!(page.page_number, 0);
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.total_items, 0);
        assert_eq!(page.page_size, 10);
    }

    #[test]
    fn test_paginated_map_keeps_metadata() {
        let page = PaginatedResult::new(3, None, 10, vec![1, 2, 3]).map(|n| n.to_string());
        assert_eq!(page.items, vec!["1", "2", "3"]);
        assert_eq!(page.total_items, 3);
        assert_eq!(page.page_number, 1);
    }
}
