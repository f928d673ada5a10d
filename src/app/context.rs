use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{GiflistError, Result};
use crate::classifier::Classifier;
use crate::config::Config;
use crate::domain::FeedSettings;
use crate::fetcher::http_fetcher::HttpListingSource;
use crate::fetcher::ListingSource;
use crate::store::{SettingsStore, SqliteSettingsStore};

pub struct AppContext {
    pub config: Config,
    pub settings_store: Arc<SqliteSettingsStore>,
    pub source: Arc<dyn ListingSource + Send + Sync>,
    pub classifier: Classifier,
}

impl AppContext {
    pub fn new(config: Config, db_path: Option<PathBuf>) -> Result<Self> {
        let db_path = match db_path {
            Some(p) => p,
            None => Self::default_db_path()?,
        };

        let settings_store = Arc::new(SqliteSettingsStore::new(&db_path)?);
        Self::with_store(config, settings_store)
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        let settings_store = Arc::new(SqliteSettingsStore::in_memory()?);
        Self::with_store(config, settings_store)
    }

    fn with_store(config: Config, settings_store: Arc<SqliteSettingsStore>) -> Result<Self> {
        let source: Arc<dyn ListingSource + Send + Sync> =
            Arc::new(HttpListingSource::new(&config.listing)?);
        let classifier = Classifier::new(config.session.nsfw_placeholder.clone());

        Ok(Self {
            config,
            settings_store,
            source,
            classifier,
        })
    }

    /// Stored settings, or the configured defaults when nothing was saved yet.
    pub async fn load_settings(&self) -> Result<FeedSettings> {
        Ok(self
            .settings_store
            .load()
            .await?
            .unwrap_or_else(|| self.config.defaults.to_settings()))
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| GiflistError::Config("Could not find data directory".into()))?;
        let giflist_dir = data_dir.join("giflist");
        std::fs::create_dir_all(&giflist_dir)?;
        Ok(giflist_dir.join("giflist.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SortOrder;

    #[tokio::test]
    async fn test_load_settings_uses_config_defaults_when_empty() {
        let mut config = Config::default();
        config.defaults.feed_name = "aww".into();
        config.defaults.page_size = 25;
        let ctx = AppContext::in_memory(config).unwrap();

        let settings = ctx.load_settings().await.unwrap();
        assert_eq!(settings.feed_name, "aww");
        assert_eq!(settings.sort_order, SortOrder::Hot);
        assert_eq!(settings.page_size, 25);
    }

    #[tokio::test]
    async fn test_load_settings_prefers_stored() {
        let ctx = AppContext::in_memory(Config::default()).unwrap();
        let stored = FeedSettings {
            feed_name: "HighQualityGifs".into(),
            sort_order: SortOrder::Top,
            page_size: 5,
        };
        ctx.settings_store.save(&stored).await.unwrap();

        assert_eq!(ctx.load_settings().await.unwrap(), stored);
    }
}
