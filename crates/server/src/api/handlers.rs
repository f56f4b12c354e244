mod channels;
mod scheduler;
mod status;
mod videos;

pub use channels::{
    create_channel, delete_channel, get_channel, get_channel_videos, get_channels, update_channel,
};
pub use scheduler::{trigger_poll, trigger_sweep};
pub use status::get_status;
pub use videos::{get_video, get_videos, set_video_kept};

// Re-export utoipa path structs for OpenAPI routing
#[doc(hidden)]
pub use channels::{
    __path_create_channel, __path_delete_channel, __path_get_channel, __path_get_channel_videos,
    __path_get_channels, __path_update_channel,
};
#[doc(hidden)]
pub use scheduler::{__path_trigger_poll, __path_trigger_sweep};
#[doc(hidden)]
pub use status::__path_get_status;
#[doc(hidden)]
pub use videos::{__path_get_video, __path_get_videos, __path_set_video_kept};

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 500;

/// Pagination parameters for the recent videos listing
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct RecentQuery {
    /// Maximum number of videos to return
    pub limit: Option<i64>,
    /// Number of videos to skip
    pub offset: Option<i64>,
}

impl RecentQuery {
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

/// Request body for the keep override
#[derive(Debug, Deserialize, ToSchema)]
pub struct KeepRequest {
    /// true exempts the video from retention deletion
    pub kept: bool,
}
