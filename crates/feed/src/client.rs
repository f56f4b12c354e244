use async_trait::async_trait;
use reqwest::Client;

use crate::models::Candidate;
use crate::parser::parse_channel_feed;
use crate::{FeedError, FeedSource};

/// Feed fetcher client for YouTube channel Atom feeds.
pub struct FeedClient {
    client: Client,
}

impl FeedClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Create a new FeedClient with a custom reqwest Client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for FeedClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedSource for FeedClient {
    /// Fetch and parse a channel feed
    ///
    /// # Example
    /// ```no_run
    /// use feed::{FeedClient, FeedSource};
    ///
    /// # async fn example() -> feed::Result<()> {
    /// let client = FeedClient::new();
    /// let candidates = client
    ///     .fetch("https://www.youtube.com/feeds/videos.xml?channel_id=UC123")
    ///     .await?;
    ///
    /// for candidate in candidates {
    ///     println!("{}", candidate.title);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    async fn fetch(&self, feed_url: &str) -> crate::Result<Vec<Candidate>> {
        tracing::debug!("Fetching feed from: {}", feed_url);

        let response = self.client.get(feed_url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(FeedError::Parse(format!(
                "HTTP {} when fetching {}",
                status, feed_url
            )));
        }

        let bytes = response.bytes().await?;
        parse_channel_feed(&bytes)
    }
}
