//! Incremental fetch, filter and paginate engine.
//!
//! ```text
//! FeedHandle → FeedController → FeedSession → PageCursor
//!                    ↓                ↓
//!              ListingSource      Classifier
//! ```
//!
//! [`FeedSession`] is a synchronous state machine: every operation returns the
//! [`FetchRequest`] to issue, if any. [`FeedController`] owns a session on a
//! tokio task, runs those requests one at a time and routes completions back.

mod controller;
mod cursor;
mod session;

pub use controller::{spawn_feed_controller, FeedCommand, FeedController, FeedHandle};
pub use cursor::PageCursor;
pub use session::{FeedSession, FetchRequest, SessionState};

use crate::domain::NormalizedPost;

/// Notifications surfaced to whoever drives a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// The visible list grew or was cleared; carries the whole list.
    ItemsChanged(Vec<NormalizedPost>),
    LoadingChanged(bool),
    /// The feed could not supply enough usable items. Emitted once per give-up.
    Exhausted,
    /// No fetch is in flight and none will be issued automatically.
    Settled,
}
