//! Configuration management for giflist.
//!
//! Configuration is read from `~/.config/giflist/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::settings::{DEFAULT_FEED_NAME, DEFAULT_PAGE_SIZE};
use crate::domain::{FeedSettings, SortOrder};

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listing: ListingConfig,
    pub session: SessionConfig,
    pub debounce: DebounceConfig,
    pub defaults: DefaultsConfig,
}

/// Upstream listing API settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.reddit.com".to_string(),
            user_agent: "giflist/0.1.0".to_string(),
            timeout_secs: 10,
        }
    }
}

impl ListingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Consecutive under-filled fetches tolerated before giving up.
    pub retry_ceiling: u32,
    /// Thumbnail substituted for posts flagged as sensitive.
    pub nsfw_placeholder: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            retry_ceiling: 20,
            nsfw_placeholder: "images/nsfw.png".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    pub quiet_ms: u64,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self { quiet_ms: 2000 }
    }
}

impl DebounceConfig {
    pub fn quiet_interval(&self) -> Duration {
        Duration::from_millis(self.quiet_ms)
    }
}

/// Settings used when nothing has been saved yet.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub feed_name: String,
    pub sort_order: SortOrder,
    pub page_size: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            feed_name: DEFAULT_FEED_NAME.to_string(),
            sort_order: SortOrder::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl DefaultsConfig {
    pub fn to_settings(&self) -> FeedSettings {
        FeedSettings {
            feed_name: self.feed_name.clone(),
            sort_order: self.sort_order,
            page_size: self.page_size.max(1),
        }
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(config_path)
    }

    pub fn load_from(config_path: PathBuf) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: config_path,
            source: e,
        })?;

        Ok(config)
    }

    /// Get the default config file path: `~/.config/giflist/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("giflist").join("config.toml"))
    }

    fn create_default_config(path: &PathBuf) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.clone(),
                source: e,
            })?;

        Ok(())
    }

    fn default_config_content() -> String {
        r##"# giflist configuration

[listing]
# Root of the listing API; feeds are read from <base_url>/r/<feed>/<sort>/.json
base_url = "https://www.reddit.com"
user_agent = "giflist/0.1.0"
# Request timeout in seconds
timeout_secs = 10

[session]
# Give up after this many consecutive fetches that fail to fill a page
retry_ceiling = 20
# Thumbnail shown instead of the upstream one for sensitive posts
nsfw_placeholder = "images/nsfw.png"

[debounce]
# Quiet period before a typed feed name is used (milliseconds)
quiet_ms = 2000

[defaults]
# Used until settings are saved
feed_name = "gifs"
# One of: hot, new, rising, top, controversial
sort_order = "hot"
page_size = 15
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
