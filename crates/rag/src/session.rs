//! Per-session search state and pagination.
//!
//! One `SessionContext` lives for one user session. It caches the results
//! and answer of the current query so paging does not re-run the pipeline.

use serde::{Deserialize, Serialize};
use sift_core::passage::Passage;

/// Pagination shows at most this many numbered pages.
pub const PAGE_WINDOW: usize = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionContext {
    pub search: Option<String>,
    pub page: usize,
    pub results: Vec<Passage>,
    pub answer: Option<String>,
}

/// One pagination control. `target` is `None` for the current page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageButton {
    pub label: String,
    pub target: Option<usize>,
}

impl PageButton {
    fn link(label: impl Into<String>, target: usize) -> Self {
        Self {
            label: label.into(),
            target: Some(target),
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.target.is_none()
    }
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            page: 1,
            ..Default::default()
        }
    }

    /// Record `query` as the active search.
    ///
    /// Returns `true` when it differs from the cached one, in which case the
    /// results, answer and page are reset.
    pub fn apply_query(&mut self, query: &str) -> bool {
        if self.search.as_deref() == Some(query) {
            return false;
        }
        self.search = Some(query.to_string());
        self.results.clear();
        self.answer = None;
        self.page = 1;
        true
    }

    pub fn has_results(&self) -> bool {
        !self.results.is_empty()
    }

    pub fn store_results(&mut self, results: Vec<Passage>) {
        self.results = results;
    }

    pub fn store_answer(&mut self, answer: impl Into<String>) {
        self.answer = Some(answer.into());
    }

    /// Move to `page`, clamped to the valid range.
    pub fn set_page(&mut self, page: usize, page_size: usize) {
        self.page = page.clamp(1, self.total_pages(page_size).max(1));
    }

    pub fn total_pages(&self, page_size: usize) -> usize {
        self.results.len().div_ceil(page_size.max(1))
    }

    /// Zero-based index of the first result on the current page.
    pub fn first_index(&self, page_size: usize) -> usize {
        self.page.saturating_sub(1) * page_size
    }

    pub fn page_slice(&self, page_size: usize) -> &[Passage] {
        let start = self.first_index(page_size).min(self.results.len());
        let end = (start + page_size).min(self.results.len());
        &self.results[start..end]
    }

    pub fn needs_pagination(&self, page_size: usize) -> bool {
        self.results.len() > page_size
    }

    pub fn pagination(&self, page_size: usize) -> Vec<PageButton> {
        if !self.needs_pagination(page_size) {
            return Vec::new();
        }
        pagination_window(self.total_pages(page_size), self.page)
    }
}

/// Buttons for a pager over `total_pages` with `current` selected.
///
/// First/Previous appear unless on page 1, Next unless on the last page.
/// Numbered pages start five before the current one and run for at most
/// ten pages.
pub fn pagination_window(total_pages: usize, current: usize) -> Vec<PageButton> {
    let mut buttons = Vec::new();
    if total_pages == 0 {
        return buttons;
    }

    if current != 1 {
        buttons.push(PageButton::link("First", 1));
        buttons.push(PageButton::link("Previous", current.saturating_sub(1).max(1)));
    }

    let start = if current > 5 { current - 5 } else { 1 };
    let end = (start + PAGE_WINDOW - 1).min(total_pages);
    for page in start..=end {
        if page == current {
            buttons.push(PageButton {
                label: page.to_string(),
                target: None,
            });
        } else {
            buttons.push(PageButton::link(page.to_string(), page));
        }
    }

    if current != total_pages {
        buttons.push(PageButton::link("Next", (current + 1).min(total_pages)));
    }

    buttons
}
