use std::collections::HashMap;

use crate::domain::NormalizedPost;
use crate::feed::FeedEvent;

pub const EXHAUSTED_MESSAGE: &str = "Having trouble finding GIFs - try another subreddit, \
     sort order, or increase the page size in your settings.";

/// Presentation state built from feed events.
///
/// Per-item loader flags live here, keyed by post id, so the engine's
/// posts stay free of UI state.
pub struct BrowserView {
    pub items: Vec<NormalizedPost>,
    pub loaders: HashMap<String, bool>,
    pub is_loading: bool,
    pub status_message: Option<String>,
}

impl BrowserView {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            loaders: HashMap::new(),
            is_loading: false,
            status_message: None,
        }
    }

    /// Fold one event into the view. Returns true when the item list changed.
    pub fn apply(&mut self, event: &FeedEvent) -> bool {
        match event {
            FeedEvent::ItemsChanged(items) => {
                if items.is_empty() {
                    self.clear_status();
                }
                self.items = items.clone();
                let items = &self.items;
                self.loaders
                    .retain(|id, _| items.iter().any(|item| item.id() == id.as_str()));
                true
            }
            FeedEvent::LoadingChanged(loading) => {
                self.is_loading = *loading;
                false
            }
            FeedEvent::Exhausted => {
                self.set_status(EXHAUSTED_MESSAGE.to_string());
                false
            }
            FeedEvent::Settled => false,
        }
    }

    pub fn get(&self, index: usize) -> Option<&NormalizedPost> {
        self.items.get(index)
    }

    pub fn is_loader_shown(&self, item_id: &str) -> bool {
        self.loaders.get(item_id).copied().unwrap_or(false)
    }

    /// Flip the loader flag for an item; returns the new value.
    pub fn toggle_loader(&mut self, item_id: &str) -> bool {
        let shown = !self.is_loader_shown(item_id);
        self.loaders.insert(item_id.to_string(), shown);
        shown
    }

    pub fn set_status(&mut self, message: String) {
        self.status_message = Some(message);
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }
}

impl Default for BrowserView {
    fn default() -> Self {
        Self::new()
    }
}
