use serde::Deserialize;

use crate::app::Result;
use crate::domain::Post;
use crate::fetcher::ListingPage;

#[derive(Debug, Deserialize)]
struct ListingEnvelope {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    after: Option<String>,
    #[serde(default)]
    children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    data: Post,
}

/// Decode a listing response body into a raw page.
pub fn parse_listing(body: &[u8]) -> Result<ListingPage> {
    let envelope: ListingEnvelope = serde_json::from_slice(body)?;
    let after = envelope.data.after;
    let items: Vec<Post> = envelope
        .data
        .children
        .into_iter()
        .map(|child| child.data)
        .collect();

    let last_item_id = items
        .last()
        .map(|p| p.cursor_id().to_string())
        .or(after);

    Ok(ListingPage {
        items,
        last_item_id,
    })
}
