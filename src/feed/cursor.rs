use crate::domain::{Post, SortOrder};
use crate::fetcher::ListingQuery;

/// Pagination state for one feed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    after: Option<String>,
    page_index: usize,
    consecutive_empty_attempts: u32,
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl PageCursor {
    pub fn new() -> Self {
        Self {
            after: None,
            page_index: 1,
            consecutive_empty_attempts: 0,
        }
    }

    pub fn after(&self) -> Option<&str> {
        self.after.as_deref()
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn consecutive_empty_attempts(&self) -> u32 {
        self.consecutive_empty_attempts
    }

    pub fn build_query(&self, feed_name: &str, sort_order: SortOrder, page_size: usize) -> ListingQuery {
        ListingQuery {
            feed_name: feed_name.to_string(),
            sort_order,
            limit: page_size,
            after: self.after.clone(),
        }
    }

    /// Move past a raw batch. The token comes from the last raw post, before
    /// any classification drops. An empty batch leaves the cursor untouched.
    pub fn advance(&mut self, raw_batch: &[Post]) {
        if let Some(last) = raw_batch.last() {
            self.after = Some(last.cursor_id().to_string());
        }
    }

    /// Only an explicit "load more" moves to the next page.
    pub fn next_page(&mut self) {
        self.page_index += 1;
    }

    pub fn record_underfilled_fetch(&mut self) -> u32 {
        self.consecutive_empty_attempts += 1;
        self.consecutive_empty_attempts
    }

    pub fn reset_attempts(&mut self) {
        self.consecutive_empty_attempts = 0;
    }
}
