mod client;
mod error;
pub mod models;
mod parser;

pub use client::FeedClient;
pub use error::FeedError;
pub use models::Candidate;

use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, FeedError>;

/// Source of video candidates for one channel feed.
///
/// Implemented by [`FeedClient`] for real YouTube channel feeds; test code
/// substitutes its own implementation.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the current candidates for a channel feed.
    ///
    /// The returned list is finite and carries no ordering guarantee.
    async fn fetch(&self, feed_url: &str) -> Result<Vec<Candidate>>;
}
