use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::app::Result;
use crate::domain::FeedSettings;
use crate::feed::{FeedSession, FetchRequest};
use crate::fetcher::{ListingPage, ListingSource};

/// Message type for the feed controller
#[derive(Debug)]
pub enum FeedCommand {
    /// Start a new session with these settings
    Reset(FeedSettings),
    /// Extend the current session by one page
    LoadMore,
    /// Stop the controller
    Shutdown,
}

struct FetchCompletion {
    generation: u64,
    result: Result<ListingPage>,
}

/// Handle to send commands to a running feed controller
#[derive(Clone)]
pub struct FeedHandle {
    tx: mpsc::Sender<FeedCommand>,
}

impl FeedHandle {
    pub async fn reset(&self, settings: FeedSettings) {
        self.send(FeedCommand::Reset(settings)).await;
    }

    pub async fn load_more(&self) {
        self.send(FeedCommand::LoadMore).await;
    }

    pub async fn shutdown(&self) {
        let _ = self.tx.send(FeedCommand::Shutdown).await;
    }

    async fn send(&self, command: FeedCommand) {
        if let Err(e) = self.tx.send(command).await {
            warn!("Feed controller is gone, dropping command: {:?}", e.0);
        }
    }
}

/// Owns a [`FeedSession`] and performs its requests.
///
/// Commands and fetch completions are handled on one task, so the session
/// is only ever touched from a single place.
pub struct FeedController {
    session: FeedSession,
    source: Arc<dyn ListingSource + Send + Sync>,
    rx: mpsc::Receiver<FeedCommand>,
    completions_tx: mpsc::UnboundedSender<FetchCompletion>,
    completions_rx: mpsc::UnboundedReceiver<FetchCompletion>,
}

impl FeedController {
    /// Create a new controller and return a handle to communicate with it
    pub fn new(
        session: FeedSession,
        source: Arc<dyn ListingSource + Send + Sync>,
    ) -> (Self, FeedHandle) {
        let (tx, rx) = mpsc::channel(32);
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let controller = Self {
            session,
            source,
            rx,
            completions_tx,
            completions_rx,
        };
        (controller, FeedHandle { tx })
    }

    /// Run the controller loop until shutdown or until every handle is dropped
    pub async fn run(mut self) {
        info!("Feed controller started");

        loop {
            tokio::select! {
                // Commands first: a reset must win over a completion it supersedes.
                biased;

                command = self.rx.recv() => match command {
                    Some(FeedCommand::Reset(settings)) => {
                        let request = self.session.reset(settings);
                        self.dispatch(request);
                    }
                    Some(FeedCommand::LoadMore) => {
                        let request = self.session.load_more();
                        self.dispatch(request);
                    }
                    Some(FeedCommand::Shutdown) | None => {
                        info!("Feed controller shutting down");
                        break;
                    }
                },
                Some(done) = self.completions_rx.recv() => {
                    let request = self.session.on_response(done.generation, done.result);
                    self.dispatch(request);
                }
            }
        }
    }

    fn dispatch(&self, request: Option<FetchRequest>) {
        let Some(request) = request else {
            return;
        };

        let source = self.source.clone();
        let completions = self.completions_tx.clone();

        tokio::spawn(async move {
            let result = source.fetch(&request.query).await;
            // The controller may have shut down meanwhile.
            let _ = completions.send(FetchCompletion {
                generation: request.generation,
                result,
            });
        });
    }
}

/// Spawn a feed controller as a tokio task
pub fn spawn_feed_controller(
    session: FeedSession,
    source: Arc<dyn ListingSource + Send + Sync>,
) -> FeedHandle {
    let (controller, handle) = FeedController::new(session, source);

    tokio::spawn(async move {
        controller.run().await;
    });

    handle
}
