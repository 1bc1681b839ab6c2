//! Pagination math
//!
//! Offset/limit derivation for a resolved page request, and the page-link
//! window a pagination widget would show (data only, no markup).

use serde::Serialize;

use crate::config::PaginationConfig;

/// A concrete page to fetch (1-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    /// Build a page request, filling gaps from the configured defaults.
    ///
    /// `per_page` is clamped to `[1, max_per_page]`; the resolver already drops
    /// out-of-range values, so the clamp only guards direct callers.
    pub fn new(page: Option<u32>, per_page: Option<u32>, config: &PaginationConfig) -> Self {
        let max = config.max_per_page.max(1);
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(config.default_per_page).clamp(1, max),
        }
    }

    /// Calculate the SQL offset
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.per_page)
    }

    /// Calculate the SQL limit
    pub fn limit(&self) -> u64 {
        u64::from(self.per_page)
    }

    /// Number of pages needed for `total_count` items
    pub fn total_pages(&self, total_count: u64) -> u32 {
        let per = u64::from(self.per_page);
        u32::try_from(total_count.div_ceil(per)).unwrap_or(u32::MAX)
    }
}

/// One entry in a page list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageLink {
    Page { number: u32, current: bool },
    Gap,
}

/// Pages to display around `current`.
///
/// A page is shown when it lies within `outer_window` of either end or within
/// `window` of the current page; each run of hidden pages collapses into one
/// [`PageLink::Gap`].
pub fn page_links(current: u32, total_pages: u32, window: u32, outer_window: u32) -> Vec<PageLink> {
    let mut links = Vec::new();
    let mut truncated = false;

    for number in 1..=total_pages {
        let left_outer = number <= outer_window;
        let right_outer = total_pages - number < outer_window;
        let inside_window = number.abs_diff(current) <= window;

        if left_outer || right_outer || inside_window {
            links.push(PageLink::Page {
                number,
                current: number == current,
            });
            truncated = false;
        } else if !truncated {
            links.push(PageLink::Gap);
            truncated = true;
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(links: &[PageLink]) -> Vec<Option<u32>> {
        links
            .iter()
            .map(|l| match l {
                PageLink::Page { number, .. } => Some(*number),
                PageLink::Gap => None,
            })
            .collect()
    }

    #[test]
    fn test_page_request_defaults() {
        let config = PaginationConfig::default();
        let req = PageRequest::new(None, None, &config);
        assert_eq!(req.page, 1);
        assert_eq!(req.per_page, 10);
        assert_eq!(req.offset(), 0);
        assert_eq!(req.limit(), 10);
    }

    #[test]
    fn test_page_request_offset() {
        let config = PaginationConfig::default();
        let req = PageRequest::new(Some(3), Some(20), &config);
        assert_eq!(req.offset(), 40);
        assert_eq!(req.limit(), 20);
    }

    #[test]
    fn test_page_request_clamps_direct_input() {
        let config = PaginationConfig::default();
        let req = PageRequest::new(Some(0), Some(500), &config);
        assert_eq!(req.page, 1);
        assert_eq!(req.per_page, 50);
    }

    #[test]
    fn test_total_pages() {
        let config = PaginationConfig::default();
        let req = PageRequest::new(None, Some(10), &config);
        assert_eq!(req.total_pages(0), 0);
        assert_eq!(req.total_pages(10), 1);
        assert_eq!(req.total_pages(11), 2);
    }

    #[test]
    fn test_page_links_window() {
        let links = page_links(5, 10, 1, 1);
        assert_eq!(
            numbers(&links),
            vec![Some(1), None, Some(4), Some(5), Some(6), None, Some(10)]
        );
        assert!(links.contains(&PageLink::Page { number: 5, current: true }));
    }

    #[test]
    fn test_page_links_no_gap_when_adjacent() {
        let links = page_links(2, 4, 1, 1);
        assert_eq!(numbers(&links), vec![Some(1), Some(2), Some(3), Some(4)]);
    }

    #[test]
    fn test_page_links_empty() {
        assert!(page_links(1, 0, 1, 1).is_empty());
    }
}
