use std::collections::HashSet;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::app::Result;
use crate::classifier::Classifier;
use crate::domain::{FeedSettings, NormalizedPost, Post};
use crate::feed::{FeedEvent, PageCursor};
use crate::fetcher::{ListingPage, ListingQuery};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Fetching,
    Settled,
}

/// A page request the session wants issued, tagged with the generation that
/// must still be current when its response comes back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub generation: u64,
    pub query: ListingQuery,
}

/// Fetch/filter/retry state machine for one feed at a time.
///
/// At most one request is outstanding. Every `reset` bumps the generation so
/// responses belonging to an earlier feed are recognised and dropped.
pub struct FeedSession {
    generation: u64,
    settings: FeedSettings,
    retry_ceiling: u32,
    classifier: Classifier,
    cursor: PageCursor,
    items: Vec<NormalizedPost>,
    seen: HashSet<String>,
    state: SessionState,
    events: UnboundedSender<FeedEvent>,
}

impl FeedSession {
    pub fn new(
        settings: FeedSettings,
        classifier: Classifier,
        retry_ceiling: u32,
        events: UnboundedSender<FeedEvent>,
    ) -> Self {
        Self {
            generation: 0,
            settings: sanitize(settings),
            retry_ceiling,
            classifier,
            cursor: PageCursor::new(),
            items: Vec::new(),
            seen: HashSet::new(),
            state: SessionState::Idle,
            events,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == SessionState::Fetching
    }

    pub fn items(&self) -> &[NormalizedPost] {
        &self.items
    }

    pub fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    pub fn settings(&self) -> &FeedSettings {
        &self.settings
    }

    /// Start over with new settings and immediately request the first page.
    pub fn reset(&mut self, settings: FeedSettings) -> Option<FetchRequest> {
        self.generation += 1;
        self.settings = sanitize(settings);
        self.cursor = PageCursor::new();
        self.items.clear();
        self.seen.clear();
        self.state = SessionState::Idle;

        info!(
            "Session {} reset: r/{} sorted by {}, {} per page",
            self.generation, self.settings.feed_name, self.settings.sort_order, self.settings.page_size
        );
        self.emit(FeedEvent::ItemsChanged(Vec::new()));

        self.fetch_more()
    }

    /// Request the next raw batch. Ignored while a request is in flight.
    pub fn fetch_more(&mut self) -> Option<FetchRequest> {
        if self.state == SessionState::Fetching {
            debug!("Fetch already in flight for session {}, ignoring", self.generation);
            return None;
        }

        self.state = SessionState::Fetching;
        self.emit(FeedEvent::LoadingChanged(true));

        Some(FetchRequest {
            generation: self.generation,
            query: self.cursor.build_query(
                &self.settings.feed_name,
                self.settings.sort_order,
                self.settings.page_size,
            ),
        })
    }

    /// Ask for one more page worth of items. Ignored while a request is in flight.
    pub fn load_more(&mut self) -> Option<FetchRequest> {
        if self.state == SessionState::Fetching {
            debug!("Load more ignored, session {} is fetching", self.generation);
            return None;
        }

        self.cursor.next_page();
        self.fetch_more()
    }

    /// Apply the outcome of a request issued by this session.
    ///
    /// Returns the follow-up request when the current page is still short.
    pub fn on_response(
        &mut self,
        generation: u64,
        result: Result<ListingPage>,
    ) -> Option<FetchRequest> {
        if generation != self.generation {
            warn!(
                "Discarding stale response for session {} (current is {})",
                generation, self.generation
            );
            return None;
        }

        if self.state != SessionState::Fetching {
            warn!("Unexpected response for session {} with no fetch in flight", generation);
            return None;
        }

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                warn!("Fetch failed for r/{}: {}", self.settings.feed_name, e);
                self.state = SessionState::Settled;
                self.emit(FeedEvent::LoadingChanged(false));
                self.emit(FeedEvent::Settled);
                return None;
            }
        };

        let raw_batch = page.items;
        let added = self.append_classified(&raw_batch);
        debug!(
            "Session {}: {} raw, {} kept, {} total",
            self.generation,
            raw_batch.len(),
            added,
            self.items.len()
        );
        if added > 0 {
            self.emit(FeedEvent::ItemsChanged(self.items.clone()));
        }

        self.cursor.advance(&raw_batch);
        self.state = SessionState::Settled;
        self.emit(FeedEvent::LoadingChanged(false));

        self.continue_after(raw_batch.is_empty())
    }

    fn append_classified(&mut self, raw_batch: &[Post]) -> usize {
        let classifier = &self.classifier;
        let seen = &mut self.seen;
        let fresh: Vec<NormalizedPost> = classifier
            .classify_batch(raw_batch)
            .filter(|post| seen.insert(post.id().to_string()))
            .collect();

        let added = fresh.len();
        self.items.extend(fresh);
        added
    }

    fn continue_after(&mut self, batch_was_empty: bool) -> Option<FetchRequest> {
        if batch_was_empty || self.cursor.consecutive_empty_attempts() > self.retry_ceiling {
            info!(
                "r/{} exhausted after {} short fetches with {} items",
                self.settings.feed_name,
                self.cursor.consecutive_empty_attempts(),
                self.items.len()
            );
            self.cursor.reset_attempts();
            self.emit(FeedEvent::Exhausted);
            self.emit(FeedEvent::Settled);
            return None;
        }

        let target = self.settings.page_size.saturating_mul(self.cursor.page_index());
        if self.items.len() < target {
            let attempts = self.cursor.record_underfilled_fetch();
            debug!(
                "Page {} short ({} of {}), continuing (attempt {})",
                self.cursor.page_index(),
                self.items.len(),
                target,
                attempts
            );
            return self.fetch_more();
        }

        self.cursor.reset_attempts();
        info!(
            "Page {} of r/{} complete with {} items",
            self.cursor.page_index(),
            self.settings.feed_name,
            self.items.len()
        );
        self.emit(FeedEvent::Settled);
        None
    }

    fn emit(&self, event: FeedEvent) {
        // Nobody listening is fine; the session keeps its own state.
        let _ = self.events.send(event);
    }
}

fn sanitize(mut settings: FeedSettings) -> FeedSettings {
    settings.page_size = settings.page_size.max(1);
    settings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::GiflistError;
    use crate::domain::{MediaKind, Post, SortOrder};
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn settings(feed: &str, page_size: usize) -> FeedSettings {
        FeedSettings {
            feed_name: feed.into(),
            sort_order: SortOrder::Hot,
            page_size,
        }
    }

    fn session(page_size: usize) -> (FeedSession, UnboundedReceiver<FeedEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = FeedSession::new(settings("gifs", page_size), Classifier::default(), 20, tx);
        (session, rx)
    }

    fn raw(name: &str, ext: &str) -> Post {
        Post {
            id: name.into(),
            name: format!("t3_{}", name),
            url: format!("https://i.imgur.com/{}.{}", name, ext),
            ..Default::default()
        }
    }

    /// `supported` gif posts followed by `unsupported` html posts, names prefixed.
    fn batch(prefix: &str, supported: usize, unsupported: usize) -> ListingPage {
        let mut items: Vec<Post> = (0..supported)
            .map(|i| raw(&format!("{}{}", prefix, i), "gif"))
            .collect();
        items.extend((0..unsupported).map(|i| raw(&format!("{}x{}", prefix, i), "html")));
        ListingPage::new(items)
    }

    fn drain(rx: &mut UnboundedReceiver<FeedEvent>) -> Vec<FeedEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn exhausted_count(events: &[FeedEvent]) -> usize {
        events.iter().filter(|e| **e == FeedEvent::Exhausted).count()
    }

    #[test]
    fn test_new_session_is_idle() {
        let (session, _rx) = session(15);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.is_loading());
        assert!(session.items().is_empty());
    }

    #[test]
    fn test_reset_issues_first_page_request() {
        let (mut session, mut rx) = session(15);
        let request = session.reset(settings("aww", 10)).unwrap();

        assert_eq!(request.generation, 1);
        assert_eq!(request.query.feed_name, "aww");
        assert_eq!(request.query.limit, 10);
        assert_eq!(request.query.after, None);
        assert_eq!(session.state(), SessionState::Fetching);
        assert_eq!(
            drain(&mut rx),
            vec![FeedEvent::ItemsChanged(vec![]), FeedEvent::LoadingChanged(true)]
        );
    }

    #[test]
    fn test_fetch_more_rejected_while_fetching() {
        let (mut session, _rx) = session(15);
        session.reset(settings("gifs", 15)).unwrap();

        assert!(session.fetch_more().is_none());
        assert!(session.load_more().is_none());
        assert_eq!(session.cursor().page_index(), 1);
    }

    #[test]
    fn test_short_page_triggers_continuation() {
        let (mut session, mut rx) = session(15);
        let first = session.reset(settings("gifs", 15)).unwrap();

        let second = session
            .on_response(first.generation, Ok(batch("a", 10, 5)))
            .expect("page is short, should continue");
        assert_eq!(session.items().len(), 10);
        assert_eq!(second.query.after.as_deref(), Some("t3_ax4"));
        assert_eq!(session.cursor().page_index(), 1);
        assert_eq!(session.cursor().consecutive_empty_attempts(), 1);

        let third = session.on_response(second.generation, Ok(batch("b", 15, 0)));
        assert!(third.is_none());
        assert_eq!(session.items().len(), 25);
        assert_eq!(session.state(), SessionState::Settled);
        assert_eq!(session.cursor().consecutive_empty_attempts(), 0);

        let events = drain(&mut rx);
        assert_eq!(events.last(), Some(&FeedEvent::Settled));
        assert_eq!(exhausted_count(&events), 0);
    }

    #[test]
    fn test_full_page_stops() {
        let (mut session, _rx) = session(5);
        let first = session.reset(settings("gifs", 5)).unwrap();

        assert!(session.on_response(first.generation, Ok(batch("a", 5, 0))).is_none());
        assert_eq!(session.items().len(), 5);
        assert!(session.items().iter().all(|p| p.media_kind == MediaKind::Gif));
    }

    #[test]
    fn test_load_more_targets_next_page() {
        let (mut session, _rx) = session(5);
        let first = session.reset(settings("gifs", 5)).unwrap();
        assert!(session.on_response(first.generation, Ok(batch("a", 5, 0))).is_none());

        let next = session.load_more().unwrap();
        assert_eq!(session.cursor().page_index(), 2);
        assert_eq!(next.query.after.as_deref(), Some("t3_a4"));

        let follow_up = session.on_response(next.generation, Ok(batch("b", 3, 2)));
        assert!(follow_up.is_some(), "8 of 10 items, should keep going");
        assert_eq!(session.cursor().page_index(), 2);
    }

    #[test]
    fn test_empty_first_batch_is_exhausted() {
        let (mut session, mut rx) = session(15);
        let first = session.reset(settings("gifs", 15)).unwrap();
        drain(&mut rx);

        assert!(session.on_response(first.generation, Ok(ListingPage::default())).is_none());
        assert!(session.items().is_empty());
        assert_eq!(session.cursor().after(), None);
        assert_eq!(session.state(), SessionState::Settled);
        assert_eq!(
            drain(&mut rx),
            vec![
                FeedEvent::LoadingChanged(false),
                FeedEvent::Exhausted,
                FeedEvent::Settled
            ]
        );
    }

    #[test]
    fn test_all_unsupported_gives_up_after_ceiling() {
        let (mut session, mut rx) = session(15);
        let mut request = session.reset(settings("gifs", 15));
        let mut fetches = 0;

        while let Some(req) = request {
            fetches += 1;
            assert!(fetches <= 100, "continuation never terminated");
            request = session.on_response(req.generation, Ok(batch(&format!("p{}", fetches), 0, 3)));
        }

        // Counter goes 0..=21; the fetch that sees 21 gives up.
        assert_eq!(fetches, 22);
        assert!(session.items().is_empty());
        assert_eq!(session.cursor().consecutive_empty_attempts(), 0);
        assert_eq!(exhausted_count(&drain(&mut rx)), 1);
    }

    #[test]
    fn test_transport_failure_leaves_state_unchanged() {
        let (mut session, mut rx) = session(5);
        let first = session.reset(settings("gifs", 5)).unwrap();
        session.on_response(first.generation, Ok(batch("a", 5, 0)));
        let next = session.load_more().unwrap();
        drain(&mut rx);

        let failure = GiflistError::Other("connection reset".into());
        assert!(session.on_response(next.generation, Err(failure)).is_none());

        assert_eq!(session.items().len(), 5);
        assert_eq!(session.cursor().after(), Some("t3_a4"));
        assert_eq!(session.state(), SessionState::Settled);
        assert_eq!(
            drain(&mut rx),
            vec![FeedEvent::LoadingChanged(false), FeedEvent::Settled]
        );

        // The user can retry explicitly.
        assert!(session.load_more().is_some());
    }

    #[test]
    fn test_stale_response_is_ignored() {
        let (mut session, mut rx) = session(5);
        let old = session.reset(settings("old", 5)).unwrap();
        let new = session.reset(settings("new", 5)).unwrap();
        drain(&mut rx);

        assert!(session.on_response(old.generation, Ok(batch("old", 5, 0))).is_none());
        assert!(session.items().is_empty());
        assert_eq!(session.state(), SessionState::Fetching);
        assert!(drain(&mut rx).is_empty());

        session.on_response(new.generation, Ok(batch("new", 5, 0)));
        assert_eq!(session.items().len(), 5);
        assert!(session.items().iter().all(|p| p.id().starts_with("t3_new")));
    }

    #[test]
    fn test_items_never_shrink_within_session() {
        let (mut session, _rx) = session(4);
        let mut request = session.reset(settings("gifs", 4));
        let pages = [batch("a", 1, 3), batch("b", 0, 4), batch("c", 2, 2), batch("d", 4, 0)];
        let mut lengths = Vec::new();

        for page in pages {
            let Some(req) = request else { break };
            request = session.on_response(req.generation, Ok(page));
            lengths.push(session.items().len());
        }

        assert_eq!(lengths, vec![1, 1, 3, 7]);
    }

    #[test]
    fn test_duplicate_posts_are_dropped() {
        let (mut session, _rx) = session(4);
        let first = session.reset(settings("gifs", 4)).unwrap();
        let second = session
            .on_response(first.generation, Ok(batch("a", 3, 0)))
            .unwrap();

        // Upstream repeats a0..a2 and then adds two new ones.
        let mut repeat = batch("a", 3, 0).items;
        repeat.extend(batch("b", 2, 0).items);
        session.on_response(second.generation, Ok(ListingPage::new(repeat)));

        let ids: Vec<&str> = session.items().iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec!["t3_a0", "t3_a1", "t3_a2", "t3_b0", "t3_b1"]);
    }

    #[test]
    fn test_reset_clears_items_and_cursor() {
        let (mut session, mut rx) = session(5);
        let first = session.reset(settings("gifs", 5)).unwrap();
        session.on_response(first.generation, Ok(batch("a", 5, 0)));
        session.load_more();
        drain(&mut rx);

        let request = session.reset(settings("aww", 5)).unwrap();
        assert!(session.items().is_empty());
        assert_eq!(session.cursor(), &PageCursor::new());
        assert_eq!(request.query.after, None);
        assert_eq!(drain(&mut rx)[0], FeedEvent::ItemsChanged(vec![]));
    }

    #[test]
    fn test_zero_page_size_is_clamped() {
        let (mut session, _rx) = session(15);
        let request = session.reset(settings("gifs", 0)).unwrap();
        assert_eq!(request.query.limit, 1);
    }

    #[test]
    fn test_huge_page_size_does_not_overflow() {
        let (mut session, mut rx) = session(15);
        let first = session.reset(settings("gifs", usize::MAX)).unwrap();
        assert!(session.on_response(first.generation, Ok(ListingPage::default())).is_none());
        assert_eq!(exhausted_count(&drain(&mut rx)), 1);

        let more = session.load_more().unwrap();
        assert_eq!(session.cursor().page_index(), 2);

        // One gif can never fill the target, so the session keeps going.
        let next = session.on_response(more.generation, Ok(batch("a", 1, 0)));
        assert!(next.is_some());
        assert_eq!(session.items().len(), 1);
        assert_eq!(exhausted_count(&drain(&mut rx)), 0);
    }
}
