use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::{Channel, CreateChannel, UpdateChannel};

/// Common SELECT fields for channel queries
const SELECT_CHANNEL: &str = r#"
    SELECT
        id, created_at, updated_at,
        external_id, name, feed_url
    FROM channel
"#;

pub struct ChannelRepository;

impl ChannelRepository {
    /// Create a new channel subscription
    pub async fn create(pool: &SqlitePool, data: CreateChannel) -> Result<Channel, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO channel (external_id, name, feed_url)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&data.external_id)
        .bind(&data.name)
        .bind(&data.feed_url)
        .fetch_one(pool)
        .await?;

        let id: i64 = sqlx::Row::get(&result, "id");
        Self::get_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Get a channel by ID
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Channel>, sqlx::Error> {
        let query = format!("{} WHERE id = $1", SELECT_CHANNEL);
        let row = sqlx::query_as::<_, ChannelRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Get a channel by its external id
    pub async fn get_by_external_id(
        pool: &SqlitePool,
        external_id: &str,
    ) -> Result<Option<Channel>, sqlx::Error> {
        let query = format!("{} WHERE external_id = $1", SELECT_CHANNEL);
        let row = sqlx::query_as::<_, ChannelRow>(&query)
            .bind(external_id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Get all channels in subscription insertion order.
    /// The poll cycle relies on this being a stable iteration order.
    pub async fn get_all(pool: &SqlitePool) -> Result<Vec<Channel>, sqlx::Error> {
        let query = format!("{} ORDER BY id ASC", SELECT_CHANNEL);
        let rows = sqlx::query_as::<_, ChannelRow>(&query)
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Update channel display metadata
    pub async fn update(
        pool: &SqlitePool,
        id: i64,
        data: UpdateChannel,
    ) -> Result<Option<Channel>, sqlx::Error> {
        let existing = Self::get_by_id(pool, id).await?;
        let Some(existing) = existing else {
            return Ok(None);
        };

        let name = data.name.unwrap_or(existing.name);

        sqlx::query("UPDATE channel SET name = $1, updated_at = datetime('now') WHERE id = $2")
            .bind(&name)
            .bind(id)
            .execute(pool)
            .await?;

        Self::get_by_id(pool, id).await
    }

    /// Delete a channel subscription by ID
    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM channel WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Internal row type for mapping SQLite results
#[derive(Debug, sqlx::FromRow)]
struct ChannelRow {
    id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    external_id: String,
    name: String,
    feed_url: String,
}

impl From<ChannelRow> for Channel {
    fn from(row: ChannelRow) -> Self {
        Self {
            id: row.id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            external_id: row.external_id,
            name: row.name,
            feed_url: row.feed_url,
        }
    }
}
