use axum::Router;
use utoipa::OpenApi;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::{openapi::ApiDoc, state::AppState};

use super::handlers;

pub fn create_router(state: AppState) -> (Router, utoipa::openapi::OpenApi) {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .routes(routes!(handlers::create_channel, handlers::get_channels))
        .routes(routes!(
            handlers::get_channel,
            handlers::update_channel,
            handlers::delete_channel
        ))
        .routes(routes!(handlers::get_channel_videos))
        .routes(routes!(handlers::get_videos))
        .routes(routes!(handlers::get_video))
        .routes(routes!(handlers::set_video_kept))
        .routes(routes!(handlers::get_status))
        .routes(routes!(handlers::trigger_poll))
        .routes(routes!(handlers::trigger_sweep))
        .with_state(state)
        .split_for_parts();

    (router, api)
}
