//! Shared helpers for unit tests.

use chrono::Utc;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use crate::models::{Channel, CreateChannel, CreateVideo, Video};
use crate::repositories::{ChannelRepository, VideoRepository};

/// In-memory SQLite pool with migrations applied.
///
/// One connection only: each `:memory:` connection is its own database.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .expect("migrations");

    pool
}

pub async fn insert_channel(pool: &SqlitePool, external_id: &str) -> Channel {
    ChannelRepository::create(
        pool,
        CreateChannel {
            external_id: external_id.to_string(),
            name: format!("Channel {}", external_id),
            feed_url: format!(
                "https://www.youtube.com/feeds/videos.xml?channel_id={}",
                external_id
            ),
        },
    )
    .await
    .expect("insert channel")
}

pub async fn insert_video(pool: &SqlitePool, channel_id: i64, external_id: &str) -> Video {
    VideoRepository::create(
        pool,
        CreateVideo {
            channel_id,
            external_id: external_id.to_string(),
            title: format!("Video {}", external_id),
            published_at: Utc::now(),
        },
    )
    .await
    .expect("insert video")
}
