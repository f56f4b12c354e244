use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A subscribed content source with a feed locator
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Channel {
    pub id: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,

    /// Stable external channel id
    pub external_id: String,
    /// Display name
    pub name: String,
    /// Feed URL polled for new videos
    pub feed_url: String,
}

/// Request body for subscribing to a new channel
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateChannel {
    /// Stable external channel id
    pub external_id: String,
    /// Display name
    pub name: String,
    /// Feed URL polled for new videos
    pub feed_url: String,
}

/// Request body for updating channel display metadata
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateChannel {
    #[serde(default)]
    pub name: Option<String>,
}
