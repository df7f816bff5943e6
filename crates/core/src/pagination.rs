//! Page-number pagination.
//!
//! Pages are 1-based. A request past the last page gets the last page, a
//! request below 1 also gets the last page, and an unreadable page parameter
//! gets page 1. An empty sequence still has one (empty) page.
//!
//! [`PageWindow`] does the arithmetic from a total count alone, so the feed
//! can push `OFFSET`/`LIMIT` into the database and still produce the same
//! pages as [`paginate`] over the full sequence.

use serde::Serialize;

/// Posts shown per feed page.
pub const POSTS_PER_PAGE: u64 = 10;

/// Read a `?page=` parameter. Missing or non-numeric input means page 1.
#[must_use]
pub fn parse_page_number(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok()).unwrap_or(1)
}

/// The resolved position of one page within a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Resolved 1-based page number.
    pub number: u64,
    /// Number of pages (at least 1).
    pub total_pages: u64,
    /// Number of items in the whole sequence.
    pub total_items: u64,
    /// Items per page.
    pub page_size: u64,
}

impl PageWindow {
    /// Resolve `requested` against a sequence of `total_items`.
    #[must_use]
    pub fn new(total_items: u64, page_size: u64, requested: i64) -> Self {
        let page_size = page_size.max(1);
        let total_pages = total_items.div_ceil(page_size).max(1);

        let number = if requested < 1 {
            total_pages
        } else {
            (requested as u64).min(total_pages)
        };

        Self {
            number,
            total_pages,
            total_items,
            page_size,
        }
    }

    /// Items to skip before this page.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.number - 1) * self.page_size
    }

    /// Items on a full page.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.page_size
    }

    /// Whether a later page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    /// Whether an earlier page exists.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.number > 1
    }
}

/// One page of an ordered sequence plus its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page, in sequence order.
    pub items: Vec<T>,
    /// Resolved 1-based page number.
    pub number: u64,
    /// Number of pages.
    pub total_pages: u64,
    /// Number of items across all pages.
    pub total_items: u64,
    /// Whether a later page exists.
    pub has_next: bool,
    /// Whether an earlier page exists.
    pub has_previous: bool,
}

impl<T> Page<T> {
    /// Attach the items fetched for `window`.
    #[must_use]
    pub fn from_window(window: PageWindow, items: Vec<T>) -> Self {
        Self {
            items,
            number: window.number,
            total_pages: window.total_pages,
            total_items: window.total_items,
            has_next: window.has_next(),
            has_previous: window.has_previous(),
        }
    }

    /// The single page of an empty sequence.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_window(PageWindow::new(0, POSTS_PER_PAGE, 1), Vec::new())
    }

    /// Transform the items, keeping the metadata.
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            total_pages: self.total_pages,
            total_items: self.total_items,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}

/// Slice `items` into pages of `page_size` and return page `page_number`.
#[must_use]
pub fn paginate<T>(items: Vec<T>, page_size: u64, page_number: i64) -> Page<T> {
    let window = PageWindow::new(items.len() as u64, page_size, page_number);

    let page_items = items
        .into_iter()
        .skip(window.offset() as usize)
        .take(window.limit() as usize)
        .collect();

    Page::from_window(window, page_items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thirteen() -> Vec<u32> {
        (1..=13).collect()
    }

    #[test]
    fn test_thirteen_items_split_ten_and_three() {
        let first = paginate(thirteen(), POSTS_PER_PAGE, 1);
        assert_eq!(first.items, (1..=10).collect::<Vec<u32>>());
        assert_eq!(first.total_pages, 2);
        assert!(first.has_next);
        assert!(!first.has_previous);

        let second = paginate(thirteen(), POSTS_PER_PAGE, 2);
        assert_eq!(second.items, vec![11, 12, 13]);
        assert!(!second.has_next);
        assert!(second.has_previous);
    }

    #[test]
    fn test_out_of_range_returns_last_page() {
        let second = paginate(thirteen(), POSTS_PER_PAGE, 2);
        let third = paginate(thirteen(), POSTS_PER_PAGE, 3);
        let far = paginate(thirteen(), POSTS_PER_PAGE, 9_999);

        assert_eq!(third, second);
        assert_eq!(far, second);
    }

    #[test]
    fn test_below_one_returns_last_page() {
        assert_eq!(paginate(thirteen(), POSTS_PER_PAGE, 0).number, 2);
        assert_eq!(paginate(thirteen(), POSTS_PER_PAGE, -4).items, vec![11, 12, 13]);
    }

    #[test]
    fn test_empty_sequence_has_one_empty_page() {
        let page = paginate(Vec::<u32>::new(), POSTS_PER_PAGE, 5);

        assert!(page.items.is_empty());
        assert_eq!(page.number, 1);
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_next && !page.has_previous);
        assert_eq!(page, Page::empty());
    }

    #[test]
    fn test_exact_multiple() {
        let items: Vec<u32> = (1..=20).collect();
        let page = paginate(items, POSTS_PER_PAGE, 3);

        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items, (11..=20).collect::<Vec<u32>>());
    }

    #[test]
    fn test_window_matches_slicing() {
        for total in 0..25_u64 {
            for requested in -1..5 {
                let window = PageWindow::new(total, 10, requested);
                let page = paginate((0..total).collect::<Vec<u64>>(), 10, requested);

                let expected: Vec<u64> = (0..total)
                    .skip(window.offset() as usize)
                    .take(window.limit() as usize)
                    .collect();
                assert_eq!(page.items, expected);
                assert_eq!(page.number, window.number);
            }
        }
    }

    #[test]
    fn test_zero_page_size_is_treated_as_one() {
        let page = paginate(vec!['a', 'b'], 0, 2);
        assert_eq!(page.items, vec!['b']);
        assert_eq!(page.total_pages, 2);
    }

    #[test]
    fn test_parse_page_number() {
        assert_eq!(parse_page_number(None), 1);
        assert_eq!(parse_page_number(Some("3")), 3);
        assert_eq!(parse_page_number(Some(" 2 ")), 2);
        assert_eq!(parse_page_number(Some("last")), 1);
        assert_eq!(parse_page_number(Some("-1")), -1);
    }

    #[test]
    fn test_map_keeps_metadata() {
        let page = paginate(thirteen(), POSTS_PER_PAGE, 2).map(|n| n * 2);

        assert_eq!(page.items, vec![22, 24, 26]);
        assert_eq!(page.number, 2);
        assert!(page.has_previous);
    }
}
