pub mod sqlite;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::FeedSettings;

pub use sqlite::SqliteSettingsStore;

/// Persistence for the user's feed preferences.
#[async_trait]
pub trait SettingsStore {
    /// `None` when nothing has been saved yet.
    async fn load(&self) -> Result<Option<FeedSettings>>;
    async fn save(&self, settings: &FeedSettings) -> Result<()>;
}
