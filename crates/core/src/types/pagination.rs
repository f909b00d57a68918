//! Page arithmetic for listing screens.

use serde::{Deserialize, Serialize};

/// A 1-based page of a listing.
///
/// ```
/// use dukkan_core::Page;
///
/// let page = Page::new(Some(3), 12);
/// assert_eq!(page.offset(), 24);
/// assert_eq!(page.total_pages(25), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub number: u32,
    pub per_page: u32,
}

impl Page {
    /// Build a page from an optional query parameter. Missing or zero means
    /// the first page.
    #[must_use]
    pub fn new(number: Option<u32>, per_page: u32) -> Self {
        Self {
            number: number.filter(|n| *n > 0).unwrap_or(1),
            per_page: per_page.max(1),
        }
    }

    /// SQL `LIMIT`.
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    /// SQL `OFFSET`.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.number.saturating_sub(1)) * i64::from(self.per_page)
    }

    /// Number of pages needed for `total` rows; at least one.
    #[must_use]
    pub fn total_pages(&self, total: i64) -> u32 {
        let per_page = i64::from(self.per_page);
        let pages = (total.max(0) + per_page - 1) / per_page;
        u32::try_from(pages).unwrap_or(u32::MAX).max(1)
    }

    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    #[must_use]
    pub fn has_next(&self, total: i64) -> bool {
        self.number < self.total_pages(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_first_page() {
        assert_eq!(Page::new(None, 12).number, 1);
        assert_eq!(Page::new(Some(0), 12).number, 1);
        assert_eq!(Page::new(None, 12).offset(), 0);
    }

    #[test]
    fn test_total_pages() {
        let page = Page::new(Some(1), 25);
        assert_eq!(page.total_pages(0), 1);
        assert_eq!(page.total_pages(25), 1);
        assert_eq!(page.total_pages(26), 2);
    }

    #[test]
    fn test_navigation() {
        let page = Page::new(Some(2), 12);
        assert!(page.has_previous());
        assert!(page.has_next(25));
        assert!(!page.has_next(24));
    }
}
