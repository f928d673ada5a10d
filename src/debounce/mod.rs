//! Settles raw feed-name input before it starts a new session.
//!
//! A value is emitted once the input has been quiet for the configured
//! interval, and only when it differs from the previously settled value.
//! Empty values settle but are never emitted.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

pub const DEFAULT_QUIET_INTERVAL: Duration = Duration::from_millis(2000);

#[derive(Debug)]
pub struct QueryDebouncer {
    quiet: Duration,
    pending: Option<(String, Instant)>,
    last_settled: Option<String>,
}

impl QueryDebouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
            last_settled: None,
        }
    }

    /// Record an input event, superseding anything still pending.
    pub fn submit(&mut self, value: impl Into<String>, now: Instant) {
        self.pending = Some((value.into(), now));
    }

    /// When the pending value settles, if there is one.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at + self.quiet)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the pending value if its quiet period has elapsed and it should
    /// be emitted.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        let deadline = self.deadline()?;
        if now < deadline {
            return None;
        }

        let (value, _) = self.pending.take()?;
        if self.last_settled.as_deref() == Some(value.as_str()) {
            debug!("Settled value unchanged, not emitting");
            return None;
        }

        self.last_settled = Some(value.clone());
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }
}

impl Default for QueryDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_INTERVAL)
    }
}

/// Handle to feed raw input into a running debouncer
#[derive(Clone)]
pub struct QueryInput {
    tx: mpsc::UnboundedSender<String>,
}

impl QueryInput {
    pub fn submit(&self, value: impl Into<String>) {
        if self.tx.send(value.into()).is_err() {
            debug!("Debouncer stopped, dropping input");
        }
    }
}

/// Drive a [`QueryDebouncer`] with a single re-armable timer.
///
/// Runs until the input side is dropped; anything still pending at that
/// point is discarded.
pub async fn run_debouncer(
    mut debouncer: QueryDebouncer,
    mut input: mpsc::UnboundedReceiver<String>,
    output: mpsc::UnboundedSender<String>,
) {
    loop {
        match debouncer.deadline() {
            Some(deadline) => {
                tokio::select! {
                    value = input.recv() => match value {
                        Some(value) => debouncer.submit(value, Instant::now()),
                        None => break,
                    },
                    _ = sleep_until(deadline) => {
                        if let Some(settled) = debouncer.poll(Instant::now()) {
                            debug!("Feed name settled: {}", settled);
                            if output.send(settled).is_err() {
                                break;
                            }
                        }
                    }
                }
            }
            None => match input.recv().await {
                Some(value) => debouncer.submit(value, Instant::now()),
                None => break,
            },
        }
    }
}

/// Spawn a debouncer task; settled values arrive on `output`.
pub fn spawn_query_debouncer(quiet: Duration, output: mpsc::UnboundedSender<String>) -> QueryInput {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(run_debouncer(QueryDebouncer::new(quiet), rx, output));
    QueryInput { tx }
}
