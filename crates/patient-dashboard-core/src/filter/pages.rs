//! Page-number strip for desktop pagination.

use serde::{Deserialize, Serialize};

/// Inner page buttons shown between the first and last page.
pub const MAX_INNER_PAGES: usize = 4;

/// One entry of the page strip.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PageItem {
    Page(usize),
    /// Skipped run of pages
    Ellipsis,
}

/// Build the page strip: first page, a window of inner pages around
/// `current`, and the last page, with ellipses over gaps.
///
/// Returns nothing when there is at most one page.
pub fn page_window(current: usize, total: usize) -> Vec<PageItem> {
    if total <= 1 {
        return Vec::new();
    }

    let mut items = vec![PageItem::Page(1)];

    let mut start = current.saturating_sub(MAX_INNER_PAGES / 2).max(2);
    let end = (start + MAX_INNER_PAGES - 1).min(total - 1);
    if end + 1 < start + MAX_INNER_PAGES {
        start = end.saturating_sub(MAX_INNER_PAGES - 1).max(2);
    }

    if start > 2 {
        items.push(PageItem::Ellipsis);
    }
    items.extend((start..=end).map(PageItem::Page));
    if end < total - 1 {
        items.push(PageItem::Ellipsis);
    }

    items.push(PageItem::Page(total));
    items
}

pub fn has_previous(current: usize) -> bool {
    current > 1
}

pub fn has_next(current: usize, total: usize) -> bool {
    current < total
}
