use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use std::path::Path;

use crate::models::Video;
use crate::repositories::VideoRepository;

/// Outcome counters for one retention sweep
#[derive(Debug, Default, Clone, Copy)]
pub struct SweepStats {
    /// Downloaded, non-kept records the sweep looked at
    pub examined: usize,
    /// Records soft-deleted with their media removed
    pub removed: usize,
    /// Records whose media files could not be removed
    pub failed: usize,
}

/// Ages out downloaded media past the retention window.
///
/// Only records with a completed download and without the user "keep"
/// override are ever considered, so the sweeper cannot race an in-flight
/// fetch: a worker that has not called `mark_downloaded` yet is invisible
/// here.
pub struct RetentionService {
    pool: SqlitePool,
    retention_age: Duration,
}

impl RetentionService {
    pub fn new(pool: SqlitePool, retention_age_days: i64) -> Self {
        Self {
            pool,
            retention_age: Duration::days(retention_age_days),
        }
    }

    /// Run one sweep over all retention candidates.
    pub async fn sweep(&self) -> Result<SweepStats, sqlx::Error> {
        let candidates = VideoRepository::get_retention_candidates(&self.pool).await?;
        let now = Utc::now();

        let mut stats = SweepStats {
            examined: candidates.len(),
            ..Default::default()
        };

        for video in candidates {
            if !should_remove(video.downloaded_at, video.kept, now, self.retention_age) {
                continue;
            }

            match self.remove_media(&video).await {
                Ok(()) => {
                    VideoRepository::mark_deleted(&self.pool, video.id).await?;
                    tracing::info!("Removed '{}' ({})", video.title, video.external_id);
                    stats.removed += 1;
                }
                Err(e) => {
                    // Leave the record untouched; the next sweep retries
                    tracing::error!("Failed to remove media for '{}': {}", video.external_id, e);
                    stats.failed += 1;
                }
            }
        }

        Ok(stats)
    }

    /// Delete the media and thumbnail files for a video.
    /// A file that is already gone is not an error.
    async fn remove_media(&self, video: &Video) -> std::io::Result<()> {
        if let Some(path) = &video.local_path {
            remove_if_exists(Path::new(path)).await?;
        }
        if let Some(path) = &video.thumbnail_path {
            remove_if_exists(Path::new(path)).await?;
        }
        Ok(())
    }
}

async fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// The retention policy itself.
///
/// A record is removed when its download completed longer ago than the
/// retention window and the user has not marked it kept. Records that were
/// never downloaded have nothing to remove.
fn should_remove(
    downloaded_at: Option<DateTime<Utc>>,
    kept: bool,
    now: DateTime<Utc>,
    retention_age: Duration,
) -> bool {
    if kept {
        return false;
    }
    match downloaded_at {
        Some(at) => now - at > retention_age,
        None => false,
    }
}
