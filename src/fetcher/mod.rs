pub mod http_fetcher;
pub mod listing;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::{Post, SortOrder};

pub use listing::parse_listing;

/// Parameters for one page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    pub feed_name: String,
    pub sort_order: SortOrder,
    pub limit: usize,
    /// Cursor of the last raw item seen; `None` for the first page.
    pub after: Option<String>,
}

/// One raw page as returned by the upstream, before classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    pub items: Vec<Post>,
    pub last_item_id: Option<String>,
}

impl ListingPage {
    pub fn new(items: Vec<Post>) -> Self {
        let last_item_id = items.last().map(|p| p.cursor_id().to_string());
        Self {
            items,
            last_item_id,
        }
    }
}

#[async_trait]
pub trait ListingSource {
    async fn fetch(&self, query: &ListingQuery) -> Result<ListingPage>;
}
