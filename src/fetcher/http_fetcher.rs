use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::app::{GiflistError, Result};
use crate::config::ListingConfig;
use crate::fetcher::{parse_listing, ListingPage, ListingQuery, ListingSource};

pub struct HttpListingSource {
    client: Client,
    base_url: Url,
}

impl HttpListingSource {
    pub fn new(config: &ListingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            base_url: Url::parse(&config.base_url)?,
        })
    }

    /// `<base>/r/<feed>/<sort>/.json?limit=<n>[&after=<token>]`
    pub fn listing_url(&self, query: &ListingQuery) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                GiflistError::Config(format!("Listing base URL {} cannot take a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(["r", query.feed_name.trim(), query.sort_order.as_str(), ".json"]);

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("limit", &query.limit.to_string());
            if let Some(after) = &query.after {
                pairs.append_pair("after", after);
            }
        }

        Ok(url)
    }
}

#[async_trait]
impl ListingSource for HttpListingSource {
    async fn fetch(&self, query: &ListingQuery) -> Result<ListingPage> {
        let url = self.listing_url(query)?;
        tracing::debug!("Fetching {}", url);

        let response = self.client.get(url).send().await?;
        response.error_for_status_ref()?;

        let body = response.bytes().await?;
        parse_listing(&body)
    }
}
