use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::error::{AppError, AppResult};
use crate::models::{Channel, CreateChannel, UpdateChannel, Video};
use crate::repositories::{ChannelRepository, VideoRepository};
use crate::state::AppState;

/// Subscribe to a new channel
#[utoipa::path(
    post,
    path = "/api/channels",
    tag = "channels",
    request_body = CreateChannel,
    responses(
        (status = 201, description = "Channel subscribed", body = Channel),
        (status = 400, description = "Channel already subscribed"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_channel(
    State(state): State<AppState>,
    Json(payload): Json<CreateChannel>,
) -> AppResult<(StatusCode, Json<Channel>)> {
    if ChannelRepository::get_by_external_id(&state.db, &payload.external_id)
        .await?
        .is_some()
    {
        return Err(AppError::bad_request(format!(
            "channel '{}' is already subscribed",
            payload.external_id
        )));
    }

    let channel = ChannelRepository::create(&state.db, payload).await?;
    tracing::info!("Subscribed to channel '{}'", channel.name);

    Ok((StatusCode::CREATED, Json(channel)))
}

/// List all subscribed channels
#[utoipa::path(
    get,
    path = "/api/channels",
    tag = "channels",
    responses(
        (status = 200, description = "Subscribed channels", body = Vec<Channel>),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_channels(State(state): State<AppState>) -> AppResult<Json<Vec<Channel>>> {
    let channels = ChannelRepository::get_all(&state.db).await?;
    Ok(Json(channels))
}

/// Get one channel
#[utoipa::path(
    get,
    path = "/api/channels/{id}",
    tag = "channels",
    params(("id" = i64, Path, description = "Channel id")),
    responses(
        (status = 200, description = "The channel", body = Channel),
        (status = 404, description = "Channel not found")
    )
)]
pub async fn get_channel(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Channel>> {
    let channel = ChannelRepository::get_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("channel {} not found", id)))?;
    Ok(Json(channel))
}

/// Update a channel's display metadata
#[utoipa::path(
    put,
    path = "/api/channels/{id}",
    tag = "channels",
    params(("id" = i64, Path, description = "Channel id")),
    request_body = UpdateChannel,
    responses(
        (status = 200, description = "Updated channel", body = Channel),
        (status = 404, description = "Channel not found")
    )
)]
pub async fn update_channel(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateChannel>,
) -> AppResult<Json<Channel>> {
    let channel = ChannelRepository::update(&state.db, id, payload)
        .await?
        .ok_or_else(|| AppError::not_found(format!("channel {} not found", id)))?;
    Ok(Json(channel))
}

/// Unsubscribe from a channel.
/// Tracked videos and queue entries go with it; downloaded files stay on
/// disk until the retention sweep would have removed them anyway.
#[utoipa::path(
    delete,
    path = "/api/channels/{id}",
    tag = "channels",
    params(("id" = i64, Path, description = "Channel id")),
    responses(
        (status = 204, description = "Channel unsubscribed"),
        (status = 404, description = "Channel not found")
    )
)]
pub async fn delete_channel(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    if !ChannelRepository::delete(&state.db, id).await? {
        return Err(AppError::not_found(format!("channel {} not found", id)));
    }
    tracing::info!("Unsubscribed from channel {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// List all videos tracked for a channel, newest first
#[utoipa::path(
    get,
    path = "/api/channels/{id}/videos",
    tag = "channels",
    params(("id" = i64, Path, description = "Channel id")),
    responses(
        (status = 200, description = "Videos of the channel", body = Vec<Video>),
        (status = 404, description = "Channel not found")
    )
)]
pub async fn get_channel_videos(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<Video>>> {
    if ChannelRepository::get_by_id(&state.db, id).await?.is_none() {
        return Err(AppError::not_found(format!("channel {} not found", id)));
    }
    let videos = VideoRepository::get_by_channel_id(&state.db, id).await?;
    Ok(Json(videos))
}
