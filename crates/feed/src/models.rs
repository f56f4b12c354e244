use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A video observed in a feed poll, not yet necessarily downloaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Stable external video id (the YouTube video id)
    pub external_id: String,
    /// Video title as published in the feed
    pub title: String,
    /// Publish timestamp from the feed entry
    pub published_at: DateTime<Utc>,
}
