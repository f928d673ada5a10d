use serde::{Deserialize, Serialize};

use crate::domain::Post;

/// Base URL that post permalinks are relative to.
pub const COMMENTS_BASE_URL: &str = "https://reddit.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Gif,
    Video,
    Unsupported,
}

impl MediaKind {
    pub fn is_supported(self) -> bool {
        self != MediaKind::Unsupported
    }

    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Gif => "gif",
            MediaKind::Video => "video",
            MediaKind::Unsupported => "unsupported",
        }
    }
}

/// A post that survived classification, ready to render.
///
/// `media_kind` is never [`MediaKind::Unsupported`]; the classifier refuses to
/// build one for unsupported media.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedPost {
    pub source: Post,
    pub media_kind: MediaKind,
    pub playable_url: String,
    /// Empty when the post carries no usable preview.
    pub snapshot_url: String,
    pub thumbnail_url: String,
    /// Title with HTML entities decoded.
    pub title: String,
}

impl NormalizedPost {
    pub fn id(&self) -> &str {
        self.source.cursor_id()
    }

    pub fn comments_url(&self) -> String {
        format!("{}{}", COMMENTS_BASE_URL, self.source.permalink)
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "(Untitled)"
        } else {
            &self.title
        }
    }
}
