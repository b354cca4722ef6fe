//! Client-side filtering and pagination over fetched sequences

use dashboard_core::Ticker;
use serde::Serialize;

/// One page of a longer sequence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page actually shown, after clamping
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// Number of pages needed for `len` items (0 for an empty sequence)
pub fn total_pages(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size.max(1))
}

/// Slice out 1-based `page`, clamping it into `[1, max(1, total_pages)]`
pub fn paginate<T: Clone>(items: &[T], page_size: usize, page: usize) -> Page<T> {
    let size = page_size.max(1);
    let total = total_pages(items.len(), size);
    let page = page.clamp(1, total.max(1));

    let start = (page - 1) * size;
    let end = (start + size).min(items.len());
    let items_on_page = items.get(start..end).map(<[T]>::to_vec).unwrap_or_default();

    Page {
        items: items_on_page,
        page,
        total_pages: total,
        total_items: items.len(),
    }
}

/// Tickers whose symbol contains `text`, ignoring case
///
/// An empty filter keeps everything.
pub fn filter_tickers(tickers: &[Ticker], text: &str) -> Vec<Ticker> {
    let needle = text.to_lowercase();
    tickers
        .iter()
        .filter(|t| t.symbol.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Filter first, then paginate the filtered list
pub fn visible_tickers(tickers: &[Ticker], text: &str, page_size: usize, page: usize) -> Page<Ticker> {
    paginate(&filter_tickers(tickers, text), page_size, page)
}
