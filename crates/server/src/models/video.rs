use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One tracked video.
///
/// `external_id` is globally unique: a video is enqueued and downloaded at
/// most once no matter how many polling cycles observe it in the feed.
/// `downloaded_at` stays NULL until a fetch completes, so a failed attempt
/// leaves the record eligible for re-enqueue on the next cycle.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Video {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Owning channel
    pub channel_id: i64,
    /// Stable external video id
    pub external_id: String,
    /// Title as published in the feed
    pub title: String,
    /// Publish timestamp from the feed
    pub published_at: DateTime<Utc>,
    /// Set when the media fetch completed successfully
    pub downloaded_at: Option<DateTime<Utc>>,
    /// Path of the downloaded media file
    pub local_path: Option<String>,
    /// Path of the downloaded thumbnail
    pub thumbnail_path: Option<String>,
    /// Media duration in seconds
    pub duration: Option<f64>,
    /// User override exempting the video from retention deletion
    pub kept: bool,
    /// Soft-delete marker set by the retention sweep
    pub deleted: bool,
}

impl Video {
    /// A record counts as downloaded only once `downloaded_at` is set.
    /// "Download attempted but failed" looks identical to "never attempted".
    pub fn is_downloaded(&self) -> bool {
        self.downloaded_at.is_some()
    }
}

/// Data for creating a new tracked video
#[derive(Debug, Clone)]
pub struct CreateVideo {
    pub channel_id: i64,
    pub external_id: String,
    pub title: String,
    pub published_at: DateTime<Utc>,
}

/// Fields recorded when a media fetch completes
#[derive(Debug, Clone)]
pub struct DownloadedMedia {
    pub local_path: String,
    pub thumbnail_path: Option<String>,
    pub duration: Option<f64>,
}
