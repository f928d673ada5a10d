use serde::{Deserialize, Serialize};

/// A single upstream listing record.
///
/// Only the fields the engine reads are modelled; everything else in the
/// upstream payload is ignored during deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Post {
    pub id: String,
    /// Fullname of the record (`t3_<id>`), used as the `after` token.
    pub name: String,
    pub title: String,
    pub url: String,
    pub thumbnail: String,
    pub permalink: String,
    pub preview: Option<Preview>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preview {
    pub images: Vec<PreviewImage>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewImage {
    pub source: ImageSource,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSource {
    pub url: Option<String>,
}

impl Post {
    /// Identifier handed to the listing source as the next page's `after` token.
    pub fn cursor_id(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    /// First preview source URL, if the upstream supplied one.
    pub fn preview_source_url(&self) -> Option<&str> {
        self.preview
            .as_ref()
            .and_then(|p| p.images.first())
            .and_then(|img| img.source.url.as_deref())
    }
}
