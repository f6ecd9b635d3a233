//! Shared pagination types for API query parameters.
//!
//! Two flavours are in use. User listings take `skip`/`limit` offsets ([`Pagination`]). Pet
//! listings are page-numbered ([`PagePagination`]) and report [`PageInfo`] alongside the results.

use serde::{Deserialize, Serialize};
use serde_with::{DefaultOnError, DisplayFromStr, serde_as};

/// Default number of items to return per page.
pub const DEFAULT_LIMIT: i64 = 10;

/// Maximum number of items that can be requested per page.
pub const MAX_LIMIT: i64 = 100;

/// Offset-based pagination: `skip` (default 0) and `limit` (default 10, clamped to 1..=100).
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub skip: Option<i64>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub limit: Option<i64>,
}

impl Pagination {
    /// Get the skip value, defaulting to 0 if not specified.
    #[inline]
    pub fn skip(&self) -> i64 {
        self.skip.unwrap_or(0).max(0)
    }

    /// Get the limit value, clamped between 1 and MAX_LIMIT.
    #[inline]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

/// Page-numbered pagination: `page` (1-based, default 1) and `limit` (default 10, clamped to
/// 1..=100). A value that is not a number falls back to the default.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct PagePagination {
    #[serde(default)]
    #[serde_as(as = "DefaultOnError<Option<DisplayFromStr>>")]
    pub page: Option<i64>,

    #[serde(default)]
    #[serde_as(as = "DefaultOnError<Option<DisplayFromStr>>")]
    pub limit: Option<i64>,
}

impl PagePagination {
    #[inline]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    #[inline]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// Rows to skip to reach the start of the page.
    #[inline]
    pub fn skip(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }
}

/// Pagination metadata returned with a page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl PageInfo {
    pub fn new(total: i64, page: i64, limit: i64) -> Self {
        Self {
            total,
            page,
            limit,
            total_pages: (total + limit - 1) / limit,
            has_next_page: page.saturating_mul(limit) < total,
            has_prev_page: page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let p = Pagination::default();
        assert_eq!(p.skip(), 0);
        assert_eq!(p.limit(), DEFAULT_LIMIT);

        let p = PagePagination::default();
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), DEFAULT_LIMIT);
        assert_eq!(p.skip(), 0);
    }

    #[test]
    fn test_limit_clamping() {
        for (requested, expected) in [(0, 1), (-5, 1), (1000, MAX_LIMIT), (50, 50)] {
            let p = Pagination {
                skip: None,
                limit: Some(requested),
            };
            assert_eq!(p.limit(), expected, "limit {requested}");

            let p = PagePagination {
                page: None,
                limit: Some(requested),
            };
            assert_eq!(p.limit(), expected, "limit {requested}");
        }
    }

    #[test]
    fn test_page_clamping_and_skip() {
        let p = PagePagination {
            page: Some(0),
            limit: Some(5),
        };
        assert_eq!(p.page(), 1);
        assert_eq!(p.skip(), 0);

        let p = PagePagination {
            page: Some(3),
            limit: Some(5),
        };
        assert_eq!(p.skip(), 10);
    }

    #[test]
    fn test_query_strings_parse() {
        let p: PagePagination = serde_json::from_value(serde_json::json!({"page": "2", "limit": "20"})).unwrap();
        assert_eq!((p.page(), p.limit(), p.skip()), (2, 20, 20));
    }

    #[test]
    fn test_non_numeric_page_falls_back_to_defaults() {
        let p: PagePagination = serde_json::from_value(serde_json::json!({"page": "abc", "limit": "ten"})).unwrap();
        assert_eq!((p.page(), p.limit()), (1, DEFAULT_LIMIT));

        let p: PagePagination = serde_json::from_value(serde_json::json!({"page": "3", "limit": ""})).unwrap();
        assert_eq!((p.page(), p.limit()), (3, DEFAULT_LIMIT));
    }

    #[test]
    fn test_page_info() {
        let info = PageInfo::new(25, 1, 10);
        assert_eq!(info.total_pages, 3);
        assert!(info.has_next_page);
        assert!(!info.has_prev_page);

        let info = PageInfo::new(25, 3, 10);
        assert!(!info.has_next_page);
        assert!(info.has_prev_page);

        let info = PageInfo::new(0, 1, 10);
        assert_eq!(info.total_pages, 0);
        assert!(!info.has_next_page);

        let json = serde_json::to_value(PageInfo::new(20, 2, 10)).unwrap();
        assert_eq!(json["totalPages"], 2);
        assert_eq!(json["hasNextPage"], false);
        assert_eq!(json["hasPrevPage"], true);
    }
}
