use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use fetcher::MediaFetcher;

use crate::models::{DownloadStatus, DownloadedMedia, QueueEntry, Video};
use crate::repositories::{QueueRepository, VideoRepository};

/// Bounded download worker pool over the persistent queue.
///
/// Concurrency is capped by a semaphore; the queue itself lives in SQLite,
/// so a crash loses nothing but in-flight work. Claims are a single
/// `UPDATE .. RETURNING`, which is what keeps two workers off the same
/// entry.
pub struct DownloadService {
    pool: SqlitePool,
    fetcher: Arc<dyn MediaFetcher>,
    media_dir: PathBuf,
    limits: Arc<Semaphore>,
    pool_size: usize,
    download_timeout: Duration,
    shutdown: CancellationToken,
    draining: AtomicBool,
}

impl DownloadService {
    pub fn new(
        pool: SqlitePool,
        fetcher: Arc<dyn MediaFetcher>,
        media_dir: PathBuf,
        pool_size: usize,
        download_timeout: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            pool,
            fetcher,
            media_dir,
            limits: Arc::new(Semaphore::new(pool_size)),
            pool_size,
            download_timeout,
            shutdown,
            draining: AtomicBool::new(false),
        }
    }

    /// Work the queue down to empty.
    ///
    /// Claims pending entries one at a time as permits free up and spawns a
    /// worker per claim, then waits for all spawned workers. At most one
    /// drain runs at a time; a second call while one is in progress returns
    /// immediately.
    pub async fn drain(self: Arc<Self>) -> Result<(), sqlx::Error> {
        if self.draining.swap(true, Ordering::SeqCst) {
            tracing::debug!("Drain already in progress, skipping");
            return Ok(());
        }

        let result = Arc::clone(&self).drain_inner().await;
        self.draining.store(false, Ordering::SeqCst);
        result
    }

    async fn drain_inner(self: Arc<Self>) -> Result<(), sqlx::Error> {
        let mut workers = JoinSet::new();

        loop {
            let permit = tokio::select! {
                permit = Arc::clone(&self.limits).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
                _ = self.shutdown.cancelled() => break,
            };

            // Shutdown may have fired while we were waiting on the permit;
            // never claim a new entry past that point
            if self.shutdown.is_cancelled() {
                break;
            }

            let entry = match QueueRepository::claim_next_pending(&self.pool).await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    // Let the workers already spawned finish before bailing
                    while workers.join_next().await.is_some() {}
                    return Err(e);
                }
            };

            let service = Arc::clone(&self);
            workers.spawn(async move {
                service.run_worker(entry).await;
                drop(permit);
            });
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Download worker panicked: {}", e);
            }
        }

        Ok(())
    }

    /// Process one claimed queue entry end to end.
    async fn run_worker(&self, entry: QueueEntry) {
        let video = match VideoRepository::get_by_id(&self.pool, entry.video_id).await {
            Ok(Some(video)) => video,
            Ok(None) => {
                // Channel unsubscribe cascaded the row away mid-claim
                tracing::warn!("Queue entry {} has no video, dropping", entry.id);
                return;
            }
            Err(e) => {
                tracing::error!("Failed to load video for entry {}: {}", entry.id, e);
                return;
            }
        };

        if video.is_downloaded() || video.deleted {
            self.finish_done(&entry).await;
            return;
        }

        let target = self.media_dir.join(format!("{}.mp4", video.external_id));
        tracing::info!("Downloading '{}' ({})", video.title, video.external_id);

        let outcome = tokio::select! {
            result = tokio::time::timeout(
                self.download_timeout,
                self.fetcher.download(&video.external_id, &target),
            ) => match result {
                Ok(Ok(media)) => Outcome::Fetched(media),
                Ok(Err(e)) => Outcome::Failed(e.to_string()),
                Err(_) => Outcome::Failed(format!(
                    "timed out after {}s",
                    self.download_timeout.as_secs()
                )),
            },
            _ = self.shutdown.cancelled() => Outcome::Failed("cancelled during shutdown".to_string()),
        };

        match outcome {
            Outcome::Fetched(media) => {
                self.finish_fetched(&entry, &video, media).await;
            }
            Outcome::Failed(reason) => {
                discard_partials(&target).await;
                tracing::warn!("Download of '{}' failed: {}", video.external_id, reason);
                if let Err(e) = QueueRepository::mark_failed(&self.pool, entry.id, &reason).await {
                    tracing::error!("Failed to record failure for entry {}: {}", entry.id, e);
                }
            }
        }
    }

    async fn finish_fetched(&self, entry: &QueueEntry, video: &Video, media: fetcher::MediaFile) {
        let downloaded = DownloadedMedia {
            local_path: media.local_path.display().to_string(),
            thumbnail_path: media.thumbnail_path.map(|p| p.display().to_string()),
            duration: media.duration,
        };

        if let Err(e) = VideoRepository::mark_downloaded(&self.pool, video.id, downloaded).await {
            tracing::error!("Failed to record download of '{}': {}", video.external_id, e);
            return;
        }
        self.finish_done(entry).await;
        tracing::info!("Downloaded '{}' ({})", video.title, video.external_id);
    }

    async fn finish_done(&self, entry: &QueueEntry) {
        if let Err(e) = QueueRepository::mark_done(&self.pool, entry.id).await {
            tracing::error!("Failed to mark entry {} done: {}", entry.id, e);
        }
    }

    /// Current queue depth and in-flight count.
    pub async fn status(&self) -> Result<DownloadStatus, sqlx::Error> {
        QueueRepository::snapshot(&self.pool).await
    }

    /// Wait up to `grace` for in-flight downloads, then cancel the rest.
    ///
    /// The shutdown token is cancelled on both paths: workers past the
    /// grace period discard their partial files and mark their entries
    /// failed, and no new entry is claimed once this returns.
    pub async fn shutdown(&self, grace: Duration) {
        let all_permits = self.limits.acquire_many(self.pool_size as u32);
        match tokio::time::timeout(grace, all_permits).await {
            Ok(Ok(permits)) => {
                // Cancel before the permits go back, so a drain loop still
                // waiting on one cannot claim a fresh entry after we return
                self.shutdown.cancel();
                drop(permits);
                tracing::info!("All downloads finished");
            }
            Ok(Err(_)) => {}
            Err(_) => {
                tracing::warn!(
                    "Downloads still running after {}s grace, cancelling",
                    grace.as_secs()
                );
                self.shutdown.cancel();
            }
        }
    }
}

enum Outcome {
    Fetched(fetcher::MediaFile),
    Failed(String),
}

/// Remove whatever a broken fetch may have left behind: the target file,
/// yt-dlp's `.part` temp file, and the thumbnail.
async fn discard_partials(target: &Path) {
    let mut part = target.as_os_str().to_owned();
    part.push(".part");

    for path in [
        target.to_path_buf(),
        PathBuf::from(part),
        target.with_extension("jpg"),
    ] {
        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::debug!("Discarded partial file {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Could not discard {}: {}", path.display(), e),
        }
    }
}
