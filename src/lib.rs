//! # giflist
//!
//! Incrementally browse the playable media posts of a subreddit feed.
//!
//! ## Architecture
//!
//! ```text
//! input → QueryDebouncer → FeedController → ListingSource
//!                               ↓
//!                   FeedSession → Classifier → FeedEvent → view
//! ```
//!
//! A session pages through the upstream listing, keeps only images, GIFs and
//! videos, and keeps fetching until the requested page size is filled or it
//! gives up.
//!
//! ## Quick Start
//!
//! ```bash
//! # Print the first two pages of r/gifs
//! giflist fetch gifs --pages 2
//!
//! # Interactive browser
//! giflist browse
//!
//! # Change the saved defaults
//! giflist settings set --sort top --page-size 25
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together config,
/// settings store, listing source and classifier.
pub mod app;

/// Media classification.
///
/// [`Classifier`](classifier::Classifier) decides whether a post is an image,
/// GIF or video and builds its [`NormalizedPost`](domain::NormalizedPost).
pub mod classifier;

/// Command-line interface using clap.
///
/// - `fetch [feed]` - Print playable posts of a feed
/// - `browse` - Interactive browser
/// - `settings show|set` - Saved preferences
pub mod cli;

/// Configuration loaded from `~/.config/giflist/config.toml`.
pub mod config;

/// Input debouncing for feed-name entry.
pub mod debounce;

/// Core domain models.
///
/// - [`Post`](domain::Post): upstream listing record
/// - [`NormalizedPost`](domain::NormalizedPost): classified, renderable post
/// - [`FeedSettings`](domain::FeedSettings): feed name, sort order, page size
pub mod domain;

/// Paginated session engine.
///
/// - [`PageCursor`](feed::PageCursor): `after` token and page index
/// - [`FeedSession`](feed::FeedSession): fetch/filter/retry state machine
/// - [`FeedController`](feed::FeedController): tokio task driving a session
pub mod feed;

/// Listing sources.
///
/// - [`ListingSource`](fetcher::ListingSource): async trait for page fetches
/// - [`HttpListingSource`](fetcher::http_fetcher::HttpListingSource): reqwest-based implementation
pub mod fetcher;

/// Settings persistence.
///
/// - [`SettingsStore`](store::SettingsStore): async load/save trait
/// - [`SqliteSettingsStore`](store::SqliteSettingsStore): SQLite implementation
pub mod store;

/// Presentation state derived from feed events.
pub mod view;
