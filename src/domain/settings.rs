use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const DEFAULT_FEED_NAME: &str = "gifs";
pub const DEFAULT_PAGE_SIZE: usize = 15;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Hot,
    New,
    Rising,
    Top,
    Controversial,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Hot => "hot",
            SortOrder::New => "new",
            SortOrder::Rising => "rising",
            SortOrder::Top => "top",
            SortOrder::Controversial => "controversial",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hot" => Ok(SortOrder::Hot),
            "new" => Ok(SortOrder::New),
            "rising" => Ok(SortOrder::Rising),
            "top" => Ok(SortOrder::Top),
            "controversial" => Ok(SortOrder::Controversial),
            other => Err(format!(
                "Invalid sort order: {}. Use hot, new, rising, top or controversial",
                other
            )),
        }
    }
}

/// User preferences that shape a feed session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    pub feed_name: String,
    pub sort_order: SortOrder,
    pub page_size: usize,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            feed_name: DEFAULT_FEED_NAME.to_string(),
            sort_order: SortOrder::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}
