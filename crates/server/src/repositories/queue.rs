use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::{DownloadStatus, QueueEntry};

/// Common SELECT fields for queue entry queries
const SELECT_QUEUE_ENTRY: &str = r#"
    SELECT
        id, created_at, updated_at,
        video_id, enqueued_at, status, error_message
    FROM queue_entry
"#;

pub struct QueueRepository;

impl QueueRepository {
    /// Enqueue a download for a video, idempotently.
    ///
    /// The UNIQUE constraint on `video_id` makes this the single locking
    /// point for concurrent enqueue attempts: against a pending, active or
    /// done entry the statement is a silent no-op; a failed entry is reset
    /// to pending so the video gets another attempt.
    ///
    /// Returns true when the video is newly pending as a result of the call.
    pub async fn enqueue(pool: &SqlitePool, video_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO queue_entry (video_id, status)
            VALUES ($1, 'pending')
            ON CONFLICT(video_id) DO UPDATE SET
                status = 'pending',
                enqueued_at = datetime('now'),
                error_message = NULL,
                updated_at = datetime('now')
            WHERE queue_entry.status = 'failed'
            "#,
        )
        .bind(video_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Get the queue entry for a video, if any
    pub async fn get_by_video_id(
        pool: &SqlitePool,
        video_id: i64,
    ) -> Result<Option<QueueEntry>, sqlx::Error> {
        let query = format!("{} WHERE video_id = $1", SELECT_QUEUE_ENTRY);
        let row = sqlx::query_as::<_, QueueEntryRow>(&query)
            .bind(video_id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Atomically claim the next pending entry and mark it active.
    ///
    /// FIFO by enqueue time, ties broken by the video's external id. The
    /// single UPDATE makes sure two workers never claim the same entry.
    pub async fn claim_next_pending(pool: &SqlitePool) -> Result<Option<QueueEntry>, sqlx::Error> {
        let row = sqlx::query_as::<_, QueueEntryRow>(
            r#"
            UPDATE queue_entry SET
                status = 'active',
                updated_at = datetime('now')
            WHERE id = (
                SELECT qe.id
                FROM queue_entry qe
                JOIN video v ON v.id = qe.video_id
                WHERE qe.status = 'pending'
                ORDER BY qe.enqueued_at ASC, v.external_id ASC
                LIMIT 1
            )
            RETURNING id, created_at, updated_at, video_id, enqueued_at, status, error_message
            "#,
        )
        .fetch_optional(pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Mark an entry done, removing it from the pending/active set
    pub async fn mark_done(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE queue_entry SET status = 'done', updated_at = datetime('now') WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark an entry failed with a reason
    pub async fn mark_failed(
        pool: &SqlitePool,
        id: i64,
        error_message: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE queue_entry SET
                status = 'failed',
                error_message = $1,
                updated_at = datetime('now')
            WHERE id = $2
            "#,
        )
        .bind(error_message)
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Reset entries left active by a previous process back to pending.
    /// Called once at startup; a killed worker can never complete its claim.
    pub async fn reset_active(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE queue_entry SET status = 'pending', updated_at = datetime('now') WHERE status = 'active'",
        )
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Compute the queue snapshot from current entry states.
    /// One grouped count; cheap enough for a polling UI.
    pub async fn snapshot(pool: &SqlitePool) -> Result<DownloadStatus, sqlx::Error> {
        let counts: Vec<(String, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM queue_entry WHERE status IN ('pending', 'active') GROUP BY status",
        )
        .fetch_all(pool)
        .await?;

        let mut queue_size = 0;
        let mut active_downloads = 0;
        for (status, count) in counts {
            match status.as_str() {
                "pending" => queue_size = count,
                "active" => active_downloads = count,
                _ => {}
            }
        }

        Ok(DownloadStatus {
            queue_size,
            active_downloads,
            is_downloading: active_downloads > 0,
        })
    }
}

/// Internal row type for mapping SQLite results
#[derive(Debug, sqlx::FromRow)]
struct QueueEntryRow {
    id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    video_id: i64,
    enqueued_at: DateTime<Utc>,
    status: String,
    error_message: Option<String>,
}

impl From<QueueEntryRow> for QueueEntry {
    fn from(row: QueueEntryRow) -> Self {
        Self {
            id: row.id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            video_id: row.video_id,
            enqueued_at: row.enqueued_at,
            status: row.status.parse().unwrap_or_default(),
            error_message: row.error_message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QueueEntryStatus;
    use crate::repositories::VideoRepository;
    use crate::test_support::{insert_channel, insert_video, test_pool};

    #[tokio::test]
    async fn enqueue_is_idempotent_for_live_entries() {
        let pool = test_pool().await;
        let channel = insert_channel(&pool, "UC1").await;
        let video = insert_video(&pool, channel.id, "vid00000001").await;

        assert!(QueueRepository::enqueue(&pool, video.id).await.unwrap());
        // Second attempt against the pending entry is a no-op
        assert!(!QueueRepository::enqueue(&pool, video.id).await.unwrap());

        let entry = QueueRepository::get_by_video_id(&pool, video.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.status, QueueEntryStatus::Pending);
    }

    #[tokio::test]
    async fn enqueue_resets_failed_entries() {
        let pool = test_pool().await;
        let channel = insert_channel(&pool, "UC1").await;
        let video = insert_video(&pool, channel.id, "vid00000001").await;

        QueueRepository::enqueue(&pool, video.id).await.unwrap();
        let entry = QueueRepository::claim_next_pending(&pool).await.unwrap().unwrap();
        QueueRepository::mark_failed(&pool, entry.id, "network timeout")
            .await
            .unwrap();

        assert!(QueueRepository::enqueue(&pool, video.id).await.unwrap());

        let entry = QueueRepository::get_by_video_id(&pool, video.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.status, QueueEntryStatus::Pending);
        assert!(entry.error_message.is_none());
    }

    #[tokio::test]
    async fn enqueue_does_not_resurrect_done_entries() {
        let pool = test_pool().await;
        let channel = insert_channel(&pool, "UC1").await;
        let video = insert_video(&pool, channel.id, "vid00000001").await;

        QueueRepository::enqueue(&pool, video.id).await.unwrap();
        let entry = QueueRepository::claim_next_pending(&pool).await.unwrap().unwrap();
        QueueRepository::mark_done(&pool, entry.id).await.unwrap();

        assert!(!QueueRepository::enqueue(&pool, video.id).await.unwrap());

        let entry = QueueRepository::get_by_video_id(&pool, video.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.status, QueueEntryStatus::Done);
    }

    #[tokio::test]
    async fn claim_is_fifo_with_external_id_tiebreak() {
        let pool = test_pool().await;
        let channel = insert_channel(&pool, "UC1").await;

        let b = insert_video(&pool, channel.id, "vid_bbbbbbb").await;
        let a = insert_video(&pool, channel.id, "vid_aaaaaaa").await;
        let c = insert_video(&pool, channel.id, "vid_ccccccc").await;
        for video_id in [b.id, a.id, c.id] {
            QueueRepository::enqueue(&pool, video_id).await.unwrap();
        }

        // Force an identical enqueue time so the external id breaks the tie
        sqlx::query("UPDATE queue_entry SET enqueued_at = '2024-01-01 00:00:00'")
            .execute(&pool)
            .await
            .unwrap();

        let first = QueueRepository::claim_next_pending(&pool).await.unwrap().unwrap();
        let second = QueueRepository::claim_next_pending(&pool).await.unwrap().unwrap();
        let third = QueueRepository::claim_next_pending(&pool).await.unwrap().unwrap();

        assert_eq!(first.video_id, a.id);
        assert_eq!(second.video_id, b.id);
        assert_eq!(third.video_id, c.id);
        assert!(QueueRepository::claim_next_pending(&pool).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn snapshot_counts_pending_and_active() {
        let pool = test_pool().await;
        let channel = insert_channel(&pool, "UC1").await;

        for i in 0..3 {
            let video = insert_video(&pool, channel.id, &format!("vid0000000{}", i)).await;
            QueueRepository::enqueue(&pool, video.id).await.unwrap();
        }
        QueueRepository::claim_next_pending(&pool).await.unwrap().unwrap();

        let status = QueueRepository::snapshot(&pool).await.unwrap();
        assert_eq!(status.queue_size, 2);
        assert_eq!(status.active_downloads, 1);
        assert!(status.is_downloading);
    }

    #[tokio::test]
    async fn snapshot_is_empty_without_entries() {
        let pool = test_pool().await;

        let status = QueueRepository::snapshot(&pool).await.unwrap();
        assert_eq!(status.queue_size, 0);
        assert_eq!(status.active_downloads, 0);
        assert!(!status.is_downloading);
    }

    #[tokio::test]
    async fn reset_active_returns_entries_to_pending() {
        let pool = test_pool().await;
        let channel = insert_channel(&pool, "UC1").await;
        let video = insert_video(&pool, channel.id, "vid00000001").await;

        QueueRepository::enqueue(&pool, video.id).await.unwrap();
        QueueRepository::claim_next_pending(&pool).await.unwrap().unwrap();

        let reset = QueueRepository::reset_active(&pool).await.unwrap();
        assert_eq!(reset, 1);

        let entry = QueueRepository::get_by_video_id(&pool, video.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.status, QueueEntryStatus::Pending);
    }

    #[tokio::test]
    async fn unsubscribe_cascades_to_queue() {
        let pool = test_pool().await;
        let channel = insert_channel(&pool, "UC1").await;
        let video = insert_video(&pool, channel.id, "vid00000001").await;
        QueueRepository::enqueue(&pool, video.id).await.unwrap();

        crate::repositories::ChannelRepository::delete(&pool, channel.id)
            .await
            .unwrap();

        assert!(VideoRepository::get_by_id(&pool, video.id)
            .await
            .unwrap()
            .is_none());
        assert!(QueueRepository::get_by_video_id(&pool, video.id)
            .await
            .unwrap()
            .is_none());
    }
}
