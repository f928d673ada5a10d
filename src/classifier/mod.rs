use html_escape::decode_html_entities;
use url::Url;

use crate::domain::{MediaKind, NormalizedPost, Post};

/// Raw thumbnail value the upstream uses to flag sensitive posts.
pub const NSFW_SENTINEL: &str = "nsfw";

pub const DEFAULT_NSFW_PLACEHOLDER: &str = "images/nsfw.png";

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];
const GIF_EXTENSIONS: &[&str] = &["gif"];
const VIDEO_EXTENSIONS: &[&str] = &["gifv", "webm", "mp4"];

/// Decides a post's media kind and derives its renderable form.
#[derive(Debug, Clone)]
pub struct Classifier {
    nsfw_placeholder: String,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DEFAULT_NSFW_PLACEHOLDER)
    }
}

impl Classifier {
    pub fn new(nsfw_placeholder: impl Into<String>) -> Self {
        Self {
            nsfw_placeholder: nsfw_placeholder.into(),
        }
    }

    /// Classify a post. Returns `None` for unsupported media.
    pub fn classify(&self, post: &Post) -> Option<NormalizedPost> {
        let media_kind = MediaKind::from_url(&post.url);
        if !media_kind.is_supported() {
            return None;
        }
        let playable_url = if media_kind == MediaKind::Video {
            rewrite_to_mp4(&post.url)
        } else {
            post.url.clone()
        };

        Some(NormalizedPost {
            source: post.clone(),
            media_kind,
            playable_url,
            snapshot_url: snapshot_url(post),
            thumbnail_url: self.thumbnail_url(&post.thumbnail),
            title: decode_html_entities(&post.title).to_string(),
        })
    }

    /// Classify a raw batch in arrival order, dropping unsupported posts.
    pub fn classify_batch<'a, I>(&'a self, posts: I) -> impl Iterator<Item = NormalizedPost> + 'a
    where
        I: IntoIterator<Item = &'a Post>,
        I::IntoIter: 'a,
    {
        posts.into_iter().filter_map(move |post| self.classify(post))
    }

    fn thumbnail_url(&self, raw: &str) -> String {
        if raw == NSFW_SENTINEL {
            self.nsfw_placeholder.clone()
        } else {
            raw.to_string()
        }
    }
}

impl MediaKind {
    /// Media kind implied by the extension of a URL's path.
    pub fn from_url(url: &str) -> Self {
        let Some(ext) = extension(url) else {
            return MediaKind::Unsupported;
        };

        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::Image
        } else if GIF_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::Gif
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::Video
        } else {
            MediaKind::Unsupported
        }
    }
}

/// Split a URL into the part before any query/fragment and the rest.
fn split_suffix(url: &str) -> (&str, &str) {
    match url.find(['?', '#']) {
        Some(idx) => url.split_at(idx),
        None => (url, ""),
    }
}

/// Byte offset of the `.` that starts the path's extension.
fn extension_dot(path: &str) -> Option<usize> {
    let dot = path.rfind('.')?;
    if path[dot..].contains('/') {
        return None;
    }
    Some(dot)
}

/// Lowercased extension of the URL's path; the host never counts.
fn extension(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let path = parsed.path();
    extension_dot(path).map(|dot| path[dot + 1..].to_ascii_lowercase())
}

/// `.gifv` and `.webm` become `.mp4`; query and fragment are kept.
fn rewrite_to_mp4(url: &str) -> String {
    let (path, suffix) = split_suffix(url);
    match extension_dot(path) {
        Some(dot) => format!("{}.mp4{}", &path[..dot], suffix),
        None => url.to_string(),
    }
}

fn snapshot_url(post: &Post) -> String {
    match post.preview_source_url() {
        Some(url) => {
            let url = url.replace("&amp;", "&");
            if url == "undefined" {
                String::new()
            } else {
                url
            }
        }
        None => String::new(),
    }
}
