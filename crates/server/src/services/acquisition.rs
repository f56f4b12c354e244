use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use feed::FeedSource;

use crate::models::{Channel, CreateVideo};
use crate::repositories::{ChannelRepository, QueueRepository, VideoRepository};
use crate::services::DownloadService;

/// Outcome counters for one poll cycle
#[derive(Debug, Default, Clone, Copy)]
pub struct PollStats {
    /// Channels whose feed was fetched and parsed
    pub channels_polled: usize,
    /// Channels whose feed fetch failed
    pub channels_failed: usize,
    /// Candidates observed across all feeds
    pub seen: usize,
    /// Videos newly made pending this cycle
    pub enqueued: usize,
}

/// Polls every subscribed channel's feed and feeds new videos into the
/// download queue.
///
/// A feed failure on one channel never aborts the cycle; the error is
/// logged, counted, and the remaining channels are still polled. Database
/// errors do abort, since nothing downstream can work without the store.
pub struct AcquisitionService {
    pool: SqlitePool,
    source: Arc<dyn FeedSource>,
    downloads: Arc<DownloadService>,
    max_download_age: Duration,
    polling: AtomicBool,
}

impl AcquisitionService {
    pub fn new(
        pool: SqlitePool,
        source: Arc<dyn FeedSource>,
        downloads: Arc<DownloadService>,
        max_download_age_days: i64,
    ) -> Self {
        Self {
            pool,
            source,
            downloads,
            max_download_age: Duration::days(max_download_age_days),
            polling: AtomicBool::new(false),
        }
    }

    /// Run one acquisition cycle: poll all channels, then drain the queue.
    ///
    /// At most one cycle runs at a time. The scheduler already never
    /// overlaps its own ticks, but the manual trigger endpoint can race a
    /// scheduled cycle; a call that finds one in progress returns empty
    /// stats without touching any feed.
    pub async fn poll_all(&self) -> Result<PollStats, sqlx::Error> {
        if self.polling.swap(true, Ordering::SeqCst) {
            tracing::debug!("Poll cycle already in progress, skipping");
            return Ok(PollStats::default());
        }

        let result = self.poll_all_inner().await;
        self.polling.store(false, Ordering::SeqCst);
        result
    }

    async fn poll_all_inner(&self) -> Result<PollStats, sqlx::Error> {
        let channels = ChannelRepository::get_all(&self.pool).await?;
        let mut stats = PollStats::default();

        for channel in &channels {
            match self.poll_channel(channel, &mut stats).await {
                Ok(()) => stats.channels_polled += 1,
                Err(PollError::Feed(e)) => {
                    tracing::warn!("Feed for channel '{}' failed: {}", channel.name, e);
                    stats.channels_failed += 1;
                }
                Err(PollError::Database(e)) => return Err(e),
            }
        }

        if stats.enqueued > 0 {
            tracing::info!("Enqueued {} new videos", stats.enqueued);
        }

        Arc::clone(&self.downloads).drain().await?;

        Ok(stats)
    }

    /// Poll one channel feed and enqueue its new candidates.
    async fn poll_channel(&self, channel: &Channel, stats: &mut PollStats) -> Result<(), PollError> {
        let candidates = self.source.fetch(&channel.feed_url).await?;
        let now = Utc::now();

        for candidate in candidates {
            stats.seen += 1;

            // Old uploads are tracked by the feed but never fetched
            if now - candidate.published_at > self.max_download_age {
                continue;
            }

            let video = VideoRepository::create(
                &self.pool,
                CreateVideo {
                    channel_id: channel.id,
                    external_id: candidate.external_id,
                    title: candidate.title,
                    published_at: candidate.published_at,
                },
            )
            .await?;

            if video.is_downloaded() || video.deleted {
                continue;
            }

            if QueueRepository::enqueue(&self.pool, video.id).await? {
                tracing::debug!("Enqueued '{}' ({})", video.title, video.external_id);
                stats.enqueued += 1;
            }
        }

        Ok(())
    }
}

enum PollError {
    Feed(feed::FeedError),
    Database(sqlx::Error),
}

impl From<feed::FeedError> for PollError {
    fn from(e: feed::FeedError) -> Self {
        Self::Feed(e)
    }
}

impl From<sqlx::Error> for PollError {
    fn from(e: sqlx::Error) -> Self {
        Self::Database(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use fetcher::{MediaFetcher, MediaFile};
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration as StdDuration;
    use tokio_util::sync::CancellationToken;

    use crate::models::{DownloadedMedia, QueueEntryStatus};
    use crate::test_support::{insert_channel, test_pool};

    /// Canned feed keyed by feed url.
    struct StaticSource {
        feeds: HashMap<String, feed::Result<Vec<feed::Candidate>>>,
    }

    #[async_trait]
    impl FeedSource for StaticSource {
        async fn fetch(&self, feed_url: &str) -> feed::Result<Vec<feed::Candidate>> {
            match self.feeds.get(feed_url) {
                Some(Ok(candidates)) => Ok(candidates.clone()),
                Some(Err(_)) => Err(feed::FeedError::Parse("bad feed".to_string())),
                None => Ok(Vec::new()),
            }
        }
    }

    struct InstantFetcher;

    #[async_trait]
    impl MediaFetcher for InstantFetcher {
        async fn download(
            &self,
            _external_id: &str,
            target_path: &Path,
        ) -> fetcher::Result<MediaFile> {
            Ok(MediaFile {
                local_path: target_path.to_path_buf(),
                duration: Some(42.0),
                thumbnail_path: None,
            })
        }
    }

    /// Feed source that stalls mid-fetch and counts its calls.
    struct SlowSource {
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl FeedSource for SlowSource {
        async fn fetch(&self, _feed_url: &str) -> feed::Result<Vec<feed::Candidate>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(StdDuration::from_millis(100)).await;
            Ok(Vec::new())
        }
    }

    /// Fetcher that fails its first attempt and succeeds afterwards.
    struct RecoveringFetcher {
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl MediaFetcher for RecoveringFetcher {
        async fn download(
            &self,
            _external_id: &str,
            target_path: &Path,
        ) -> fetcher::Result<MediaFile> {
            if self.attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(fetcher::FetchError::failed("connection reset"));
            }
            Ok(MediaFile {
                local_path: target_path.to_path_buf(),
                duration: None,
                thumbnail_path: None,
            })
        }
    }

    fn candidate(external_id: &str, published_at: DateTime<Utc>) -> feed::Candidate {
        feed::Candidate {
            external_id: external_id.to_string(),
            title: format!("Video {}", external_id),
            published_at,
        }
    }

    fn feed_url(external_id: &str) -> String {
        format!(
            "https://www.youtube.com/feeds/videos.xml?channel_id={}",
            external_id
        )
    }

    fn acquisition(
        pool: &SqlitePool,
        feeds: HashMap<String, feed::Result<Vec<feed::Candidate>>>,
    ) -> Arc<AcquisitionService> {
        acquisition_with(pool, Arc::new(StaticSource { feeds }), Arc::new(InstantFetcher))
    }

    fn acquisition_with(
        pool: &SqlitePool,
        source: Arc<dyn FeedSource>,
        fetcher: Arc<dyn MediaFetcher>,
    ) -> Arc<AcquisitionService> {
        let downloads = Arc::new(DownloadService::new(
            pool.clone(),
            fetcher,
            std::env::temp_dir(),
            3,
            StdDuration::from_secs(5),
            CancellationToken::new(),
        ));
        Arc::new(AcquisitionService::new(pool.clone(), source, downloads, 30))
    }

    #[tokio::test]
    async fn cycle_enqueues_only_new_fresh_candidates() {
        let pool = test_pool().await;
        let channel = insert_channel(&pool, "UC1").await;

        // One already downloaded, one too old, one genuinely new
        let downloaded = VideoRepository::create(
            &pool,
            CreateVideo {
                channel_id: channel.id,
                external_id: "vid_done___".to_string(),
                title: "Already there".to_string(),
                published_at: Utc::now() - Duration::days(1),
            },
        )
        .await
        .unwrap();
        VideoRepository::mark_downloaded(
            &pool,
            downloaded.id,
            DownloadedMedia {
                local_path: "/m/done.mp4".to_string(),
                thumbnail_path: None,
                duration: None,
            },
        )
        .await
        .unwrap();

        let feeds = HashMap::from([(
            feed_url("UC1"),
            Ok(vec![
                candidate("vid_done___", Utc::now() - Duration::days(1)),
                candidate("vid_ancient", Utc::now() - Duration::days(45)),
                candidate("vid_new____", Utc::now() - Duration::hours(2)),
            ]),
        )]);

        let service = acquisition(&pool, feeds);
        let stats = service.poll_all().await.unwrap();

        assert_eq!(stats.channels_polled, 1);
        assert_eq!(stats.seen, 3);
        assert_eq!(stats.enqueued, 1);

        // The new video went through the whole pipeline
        let new = VideoRepository::get_by_external_id(&pool, "vid_new____")
            .await
            .unwrap()
            .unwrap();
        assert!(new.is_downloaded());
        let entry = QueueRepository::get_by_video_id(&pool, new.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.status, QueueEntryStatus::Done);

        // The old candidate was never tracked
        assert!(VideoRepository::get_by_external_id(&pool, "vid_ancient")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn repeated_cycles_do_not_redownload() {
        let pool = test_pool().await;
        insert_channel(&pool, "UC1").await;

        let feeds = HashMap::from([(
            feed_url("UC1"),
            Ok(vec![candidate("vid_new____", Utc::now())]),
        )]);
        let service = acquisition(&pool, feeds);

        let first = service.poll_all().await.unwrap();
        assert_eq!(first.enqueued, 1);

        let second = service.poll_all().await.unwrap();
        assert_eq!(second.seen, 1);
        assert_eq!(second.enqueued, 0);
    }

    #[tokio::test]
    async fn one_bad_feed_does_not_abort_the_cycle() {
        let pool = test_pool().await;
        insert_channel(&pool, "UC_bad").await;
        insert_channel(&pool, "UC_good").await;

        let feeds = HashMap::from([
            (
                feed_url("UC_bad"),
                Err(feed::FeedError::Parse("bad feed".to_string())),
            ),
            (
                feed_url("UC_good"),
                Ok(vec![candidate("vid_new____", Utc::now())]),
            ),
        ]);

        let service = acquisition(&pool, feeds);
        let stats = service.poll_all().await.unwrap();

        assert_eq!(stats.channels_polled, 1);
        assert_eq!(stats.channels_failed, 1);
        assert_eq!(stats.enqueued, 1);
    }

    #[tokio::test]
    async fn failed_download_is_reenqueued_exactly_once_next_cycle() {
        let pool = test_pool().await;
        insert_channel(&pool, "UC1").await;

        let feeds = HashMap::from([(
            feed_url("UC1"),
            Ok(vec![candidate("vid_retry__", Utc::now())]),
        )]);
        let fetcher = Arc::new(RecoveringFetcher {
            attempts: AtomicUsize::new(0),
        });
        let service = acquisition_with(&pool, Arc::new(StaticSource { feeds }), fetcher.clone());

        // First cycle: enqueued, attempted, failed
        let first = service.poll_all().await.unwrap();
        assert_eq!(first.enqueued, 1);

        let video = VideoRepository::get_by_external_id(&pool, "vid_retry__")
            .await
            .unwrap()
            .unwrap();
        assert!(!video.is_downloaded());
        let entry = QueueRepository::get_by_video_id(&pool, video.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.status, QueueEntryStatus::Failed);

        // Second cycle: the failed entry is re-enqueued once and succeeds
        let second = service.poll_all().await.unwrap();
        assert_eq!(second.enqueued, 1);

        let video = VideoRepository::get_by_id(&pool, video.id)
            .await
            .unwrap()
            .unwrap();
        assert!(video.is_downloaded());
        let entry = QueueRepository::get_by_video_id(&pool, video.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.status, QueueEntryStatus::Done);

        // Downloaded now, a third cycle leaves it alone
        let third = service.poll_all().await.unwrap();
        assert_eq!(third.enqueued, 0);
        assert_eq!(fetcher.attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn manual_trigger_skips_while_cycle_in_progress() {
        let pool = test_pool().await;
        insert_channel(&pool, "UC1").await;

        let source = Arc::new(SlowSource {
            fetches: AtomicUsize::new(0),
        });
        let service = acquisition_with(&pool, source.clone(), Arc::new(InstantFetcher));

        let scheduled = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.poll_all().await })
        };
        tokio::time::sleep(StdDuration::from_millis(20)).await;

        // Concurrent trigger finds a cycle in progress and backs off
        let triggered = service.poll_all().await.unwrap();
        assert_eq!(triggered.channels_polled, 0);

        let scheduled = scheduled.await.unwrap().unwrap();
        assert_eq!(scheduled.channels_polled, 1);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn deleted_videos_are_not_reacquired() {
        let pool = test_pool().await;
        let channel = insert_channel(&pool, "UC1").await;

        let video = VideoRepository::create(
            &pool,
            CreateVideo {
                channel_id: channel.id,
                external_id: "vid_swept__".to_string(),
                title: "Swept away".to_string(),
                published_at: Utc::now() - Duration::days(1),
            },
        )
        .await
        .unwrap();
        VideoRepository::mark_deleted(&pool, video.id).await.unwrap();

        let feeds = HashMap::from([(
            feed_url("UC1"),
            Ok(vec![candidate("vid_swept__", Utc::now() - Duration::days(1))]),
        )]);

        let service = acquisition(&pool, feeds);
        let stats = service.poll_all().await.unwrap();

        assert_eq!(stats.enqueued, 0);
        assert!(QueueRepository::get_by_video_id(&pool, video.id)
            .await
            .unwrap()
            .is_none());
    }
}
