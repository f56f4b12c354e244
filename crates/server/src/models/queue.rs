use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

/// Queue entry status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum QueueEntryStatus {
    #[default]
    Pending,
    Active,
    Done,
    Failed,
}

impl QueueEntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueEntryStatus::Pending => "pending",
            QueueEntryStatus::Active => "active",
            QueueEntryStatus::Done => "done",
            QueueEntryStatus::Failed => "failed",
        }
    }
}

impl FromStr for QueueEntryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(QueueEntryStatus::Pending),
            "active" => Ok(QueueEntryStatus::Active),
            "done" => Ok(QueueEntryStatus::Done),
            "failed" => Ok(QueueEntryStatus::Failed),
            _ => Err(format!("Invalid queue entry status: {}", s)),
        }
    }
}

/// An in-flight or pending request to download one video.
///
/// At most one entry exists per video id at any time, enforced by a UNIQUE
/// constraint on `video_id`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QueueEntry {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// The video this entry downloads
    pub video_id: i64,
    /// When the entry was (re-)enqueued; drained FIFO on this
    pub enqueued_at: DateTime<Utc>,
    /// Entry state
    pub status: QueueEntryStatus,
    /// Failure reason for failed entries
    pub error_message: Option<String>,
}

/// Snapshot of the download queue, derived from current entry states.
/// Computed on demand, never stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct DownloadStatus {
    /// Count of pending entries
    pub queue_size: i64,
    /// Count of active entries
    pub active_downloads: i64,
    /// Whether any download is in flight
    pub is_downloading: bool,
}
