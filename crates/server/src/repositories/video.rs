use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::{CreateVideo, DownloadedMedia, Video};

/// Common SELECT fields for video queries
const SELECT_VIDEO: &str = r#"
    SELECT
        id, created_at, updated_at,
        channel_id, external_id, title, published_at,
        downloaded_at, local_path, thumbnail_path, duration,
        kept, deleted
    FROM video
"#;

pub struct VideoRepository;

impl VideoRepository {
    /// Create a tracked video, idempotent on the external id.
    ///
    /// The UNIQUE constraint on `external_id` is the locking point for
    /// concurrent create attempts: a duplicate insert is a silent no-op and
    /// the existing record is returned.
    pub async fn create(pool: &SqlitePool, data: CreateVideo) -> Result<Video, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO video (channel_id, external_id, title, published_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT(external_id) DO NOTHING
            "#,
        )
        .bind(data.channel_id)
        .bind(&data.external_id)
        .bind(&data.title)
        .bind(data.published_at)
        .execute(pool)
        .await?;

        Self::get_by_external_id(pool, &data.external_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Get a video by ID
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Video>, sqlx::Error> {
        let query = format!("{} WHERE id = $1", SELECT_VIDEO);
        let row = sqlx::query_as::<_, VideoRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Get a video by its external id
    pub async fn get_by_external_id(
        pool: &SqlitePool,
        external_id: &str,
    ) -> Result<Option<Video>, sqlx::Error> {
        let query = format!("{} WHERE external_id = $1", SELECT_VIDEO);
        let row = sqlx::query_as::<_, VideoRow>(&query)
            .bind(external_id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Get all videos for a channel, newest first
    pub async fn get_by_channel_id(
        pool: &SqlitePool,
        channel_id: i64,
    ) -> Result<Vec<Video>, sqlx::Error> {
        let query = format!(
            "{} WHERE channel_id = $1 ORDER BY published_at DESC",
            SELECT_VIDEO
        );
        let rows = sqlx::query_as::<_, VideoRow>(&query)
            .bind(channel_id)
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get downloaded, non-deleted videos, newest first
    pub async fn get_recent(
        pool: &SqlitePool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Video>, sqlx::Error> {
        let query = format!(
            "{} WHERE deleted = 0 AND local_path IS NOT NULL ORDER BY published_at DESC LIMIT $1 OFFSET $2",
            SELECT_VIDEO
        );
        let rows = sqlx::query_as::<_, VideoRow>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get all downloaded, non-kept, non-deleted videos.
    /// The retention sweep applies the age policy on top of this set.
    pub async fn get_retention_candidates(pool: &SqlitePool) -> Result<Vec<Video>, sqlx::Error> {
        let query = format!(
            "{} WHERE downloaded_at IS NOT NULL AND kept = 0 AND deleted = 0",
            SELECT_VIDEO
        );
        let rows = sqlx::query_as::<_, VideoRow>(&query)
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Record a completed media fetch
    pub async fn mark_downloaded(
        pool: &SqlitePool,
        id: i64,
        media: DownloadedMedia,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE video SET
                downloaded_at = datetime('now'),
                local_path = $1,
                thumbnail_path = $2,
                duration = $3,
                updated_at = datetime('now')
            WHERE id = $4
            "#,
        )
        .bind(&media.local_path)
        .bind(&media.thumbnail_path)
        .bind(media.duration)
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Soft-delete a video after its media files were removed.
    /// Metadata stays around for history; the paths are cleared so the
    /// record can never be served again.
    pub async fn mark_deleted(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE video SET
                deleted = 1,
                local_path = NULL,
                thumbnail_path = NULL,
                updated_at = datetime('now')
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Set or clear the user "keep" override
    pub async fn set_kept(pool: &SqlitePool, id: i64, kept: bool) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE video SET kept = $1, updated_at = datetime('now') WHERE id = $2")
                .bind(kept)
                .bind(id)
                .execute(pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Override the download timestamp. Test-only escape hatch for building
    /// records of a known age.
    #[cfg(test)]
    pub async fn set_downloaded_at(
        pool: &SqlitePool,
        id: i64,
        downloaded_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE video SET downloaded_at = $1 WHERE id = $2")
            .bind(downloaded_at)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}

/// Internal row type for mapping SQLite results
#[derive(Debug, sqlx::FromRow)]
struct VideoRow {
    id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    channel_id: i64,
    external_id: String,
    title: String,
    published_at: DateTime<Utc>,
    downloaded_at: Option<DateTime<Utc>>,
    local_path: Option<String>,
    thumbnail_path: Option<String>,
    duration: Option<f64>,
    kept: bool,
    deleted: bool,
}

impl From<VideoRow> for Video {
    fn from(row: VideoRow) -> Self {
        Self {
            id: row.id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            channel_id: row.channel_id,
            external_id: row.external_id,
            title: row.title,
            published_at: row.published_at,
            downloaded_at: row.downloaded_at,
            local_path: row.local_path,
            thumbnail_path: row.thumbnail_path,
            duration: row.duration,
            kept: row.kept,
            deleted: row.deleted,
        }
    }
}
