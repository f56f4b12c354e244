use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::{KeepRequest, RecentQuery};
use crate::error::{AppError, AppResult};
use crate::models::Video;
use crate::repositories::VideoRepository;
use crate::state::AppState;

/// List downloaded videos, newest first
#[utoipa::path(
    get,
    path = "/api/videos",
    tag = "videos",
    params(RecentQuery),
    responses(
        (status = 200, description = "Downloaded videos", body = Vec<Video>),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_videos(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> AppResult<Json<Vec<Video>>> {
    let videos =
        VideoRepository::get_recent(&state.db, query.limit(), query.offset()).await?;
    Ok(Json(videos))
}

/// Get one video
#[utoipa::path(
    get,
    path = "/api/videos/{id}",
    tag = "videos",
    params(("id" = i64, Path, description = "Video id")),
    responses(
        (status = 200, description = "The video", body = Video),
        (status = 404, description = "Video not found")
    )
)]
pub async fn get_video(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Video>> {
    let video = VideoRepository::get_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("video {} not found", id)))?;
    Ok(Json(video))
}

/// Set or clear the "keep" override.
/// A kept video is never removed by the retention sweep.
#[utoipa::path(
    put,
    path = "/api/videos/{id}/keep",
    tag = "videos",
    params(("id" = i64, Path, description = "Video id")),
    request_body = KeepRequest,
    responses(
        (status = 200, description = "Updated video", body = Video),
        (status = 404, description = "Video not found")
    )
)]
pub async fn set_video_kept(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<KeepRequest>,
) -> AppResult<Json<Video>> {
    if !VideoRepository::set_kept(&state.db, id, payload.kept).await? {
        return Err(AppError::not_found(format!("video {} not found", id)));
    }

    let video = VideoRepository::get_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("video {} not found", id)))?;
    tracing::info!(
        "Video '{}' is now {}",
        video.external_id,
        if video.kept { "kept" } else { "not kept" }
    );
    Ok(Json(video))
}
