//! Query contract: ordering, direction, and pagination.
//!
//! Both adapters execute the same algorithm from these inputs:
//!
//! 1. A missing collection resolves to an empty result, not an error.
//! 2. `total_entries` is the unfiltered collection count.
//! 3. Iteration follows the named index when the schema declares it,
//!    otherwise primary-key order; descending reverses iteration.
//! 4. The offset is `per_page * (page - 1)` when `page > 1`, applied by
//!    advancing the cursor (native) or an `OFFSET` clause (SQL).
//! 5. The limit is `per_page` whenever paging parameters are present.
//!
//! `per_page` defaults to 10 when `page` is given alone; `per_page` alone
//! limits without offsetting.

use crate::Record;

/// Page size assumed when `page` is set and `per_page` is not.
pub const DEFAULT_PER_PAGE: u32 = 10;

/// Sort direction for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    /// Ascending iteration (the default).
    #[default]
    Ascending,
    /// Descending iteration.
    Descending,
}

impl SortMode {
    /// Parses a caller-supplied mode string. Anything but `"desc"` is
    /// ascending.
    #[must_use]
    pub fn parse(mode: &str) -> Self {
        match mode {
            "desc" => Self::Descending,
            _ => Self::Ascending,
        }
    }
}

/// A declarative query: order by field, direction, page, per-page.
#[derive(Debug, Clone, Default)]
pub struct Query {
    /// Field to order by. Falls back to primary-key order unless the
    /// schema declares an index on this field.
    pub order: Option<String>,
    /// Iteration direction.
    pub sort_mode: SortMode,
    /// 1-based page number.
    pub page: Option<u32>,
    /// Records per page.
    pub per_page: Option<u32>,
}

impl Query {
    /// Creates a query with no ordering or paging.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Orders results by `field`.
    #[must_use]
    pub fn order(mut self, field: impl Into<String>) -> Self {
        self.order = Some(field.into());
        self
    }

    /// Sets the sort direction.
    #[must_use]
    pub fn sort_mode(mut self, mode: SortMode) -> Self {
        self.sort_mode = mode;
        self
    }

    /// Selects a 1-based page.
    #[must_use]
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Sets the page size.
    #[must_use]
    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    /// The effective page size: explicit `per_page`, or the default when
    /// only `page` was given, or `None` (unbounded) without paging.
    pub(crate) fn resolved_per_page(&self) -> Option<u32> {
        self.per_page
            .or_else(|| self.page.map(|_| DEFAULT_PER_PAGE))
    }

    /// Records to skip before materializing: `per_page * (page - 1)` when
    /// `page > 1`, else zero.
    pub(crate) fn offset(&self) -> u64 {
        match (self.page, self.resolved_per_page()) {
            (Some(page), Some(per_page)) if page > 1 => {
                u64::from(per_page) * u64::from(page - 1)
            }
            _ => 0,
        }
    }
}

/// The outcome of a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// Records on the selected page, in iteration order.
    pub results: Vec<Record>,
    /// Count of all records in the collection, irrespective of paging.
    pub total_entries: u64,
}

impl QueryResult {
    /// An empty result for a collection that does not exist.
    #[must_use]
    pub(crate) fn empty() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_sort_mode() {
        assert_eq!(SortMode::parse("asc"), SortMode::Ascending);
        assert_eq!(SortMode::parse("desc"), SortMode::Descending);
        assert_eq!(SortMode::parse("sideways"), SortMode::Ascending);
        assert_eq!(SortMode::parse(""), SortMode::Ascending);
    }

    #[test]
    fn no_paging_means_unbounded() {
        let q = Query::new().order("x");
        assert_eq!(q.resolved_per_page(), None);
        assert_eq!(q.offset(), 0);
    }

    #[test]
    fn page_alone_defaults_per_page() {
        let q = Query::new().page(1);
        assert_eq!(q.resolved_per_page(), Some(DEFAULT_PER_PAGE));
        assert_eq!(q.offset(), 0);

        let q = Query::new().page(3);
        assert_eq!(q.offset(), 20);
    }

    #[test]
    fn per_page_alone_limits_without_offset() {
        let q = Query::new().per_page(5);
        assert_eq!(q.resolved_per_page(), Some(5));
        assert_eq!(q.offset(), 0);
    }

    #[test]
    fn page_below_two_contributes_no_offset() {
        assert_eq!(Query::new().page(1).per_page(7).offset(), 0);
        assert_eq!(Query::new().page(0).per_page(7).offset(), 0);
        assert_eq!(Query::new().page(2).per_page(7).offset(), 7);
    }

    proptest! {
        /// The offset/limit pair always selects exactly the slice
        /// `ordered[(page-1)*per_page .. page*per_page]`.
        #[test]
        fn window_matches_slice_semantics(
            len in 0usize..200,
            page in 1u32..20,
            per_page in 1u32..20,
        ) {
            let q = Query::new().page(page).per_page(per_page);
            let ordered: Vec<usize> = (0..len).collect();

            let skip = q.offset() as usize;
            let take = q.resolved_per_page().unwrap() as usize;
            let window: Vec<usize> =
                ordered.iter().skip(skip).take(take).copied().collect();

            let start = ((page - 1) * per_page) as usize;
            let end = (page * per_page) as usize;
            let expected: Vec<usize> = ordered
                .get(start.min(len)..end.min(len))
                .unwrap_or(&[])
                .to_vec();

            prop_assert!(window.len() <= per_page as usize);
            prop_assert_eq!(window, expected);
        }
    }
}
