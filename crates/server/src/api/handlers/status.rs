use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::models::DownloadStatus;
use crate::state::AppState;

/// Live snapshot of the download queue
#[utoipa::path(
    get,
    path = "/api/status",
    tag = "status",
    responses(
        (status = 200, description = "Queue depth and in-flight downloads", body = DownloadStatus),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_status(State(state): State<AppState>) -> AppResult<Json<DownloadStatus>> {
    let status = state.downloads.status().await?;
    Ok(Json(status))
}
