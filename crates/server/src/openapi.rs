use utoipa::OpenApi;

use crate::api::handlers::KeepRequest;
use crate::models::{Channel, CreateChannel, DownloadStatus, UpdateChannel, Video};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tubefeed API",
        version = "1.0.0"
    ),
    tags(
        (name = "channels", description = "Channel subscription endpoints"),
        (name = "videos", description = "Downloaded video endpoints"),
        (name = "status", description = "Download queue status endpoints"),
        (name = "scheduler", description = "Manual job trigger endpoints")
    ),
    components(schemas(
        Channel,
        CreateChannel,
        UpdateChannel,
        Video,
        DownloadStatus,
        KeepRequest
    ))
)]
pub struct ApiDoc;
