use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use rusqlite_migration::{Migrations, M};

use crate::app::{GiflistError, Result};
use crate::domain::FeedSettings;
use crate::store::SettingsStore;

const SETTINGS_KEY: &str = "settings";

pub struct SqliteSettingsStore {
    conn: Mutex<Connection>,
}

impl SqliteSettingsStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.lock()?;
        migrations
            .to_latest(&mut conn)
            .map_err(|e| GiflistError::Migration(e.to_string()))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            GiflistError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    /// RFC 3339 time of the last save, if any.
    pub fn updated_at(&self) -> Result<Option<String>> {
        let conn = self.lock()?;
        let updated_at = conn
            .query_row(
                "SELECT updated_at FROM settings WHERE key = ?1",
                params![SETTINGS_KEY],
                |row| row.get(0),
            )
            .optional()?;
        Ok(updated_at)
    }
}

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    async fn load(&self) -> Result<Option<FeedSettings>> {
        let conn = self.lock()?;
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![SETTINGS_KEY],
                |row| row.get(0),
            )
            .optional()?;

        match value {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, settings: &FeedSettings) -> Result<()> {
        let json = serde_json::to_string(settings)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![SETTINGS_KEY, json, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SortOrder;
    use tokio_test::assert_ok;

    fn custom() -> FeedSettings {
        FeedSettings {
            feed_name: "reactiongifs".into(),
            sort_order: SortOrder::New,
            page_size: 30,
        }
    }

    #[tokio::test]
    async fn test_load_empty_store() {
        let store = SqliteSettingsStore::in_memory().unwrap();
        assert_eq!(store.load().await.unwrap(), None);
        assert_eq!(store.updated_at().unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let store = SqliteSettingsStore::in_memory().unwrap();
        assert_ok!(store.save(&custom()).await);

        assert_eq!(store.load().await.unwrap(), Some(custom()));
        assert!(store.updated_at().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let store = SqliteSettingsStore::in_memory().unwrap();
        store.save(&FeedSettings::default()).await.unwrap();
        store.save(&custom()).await.unwrap();

        assert_eq!(store.load().await.unwrap(), Some(custom()));
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("giflist.db");

        {
            let store = SqliteSettingsStore::new(&path).unwrap();
            store.save(&custom()).await.unwrap();
        }

        let store = SqliteSettingsStore::new(&path).unwrap();
        assert_eq!(store.load().await.unwrap(), Some(custom()));
    }

    #[tokio::test]
    async fn test_corrupt_value_is_an_error() {
        let store = SqliteSettingsStore::in_memory().unwrap();
        store
            .lock()
            .unwrap()
            .execute(
                "INSERT INTO settings (key, value, updated_at) VALUES ('settings', 'not json', '')",
                [],
            )
            .unwrap();

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, GiflistError::Json(_)));
    }
}
