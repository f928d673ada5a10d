pub mod post;
pub mod normalized;
pub mod settings;

pub use normalized::{MediaKind, NormalizedPost};
pub use post::{ImageSource, Post, Preview, PreviewImage};
pub use settings::{FeedSettings, SortOrder};
