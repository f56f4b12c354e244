use axum::extract::State;

use crate::error::{AppError, AppResult};
use crate::services::SchedulerJob;
use crate::state::AppState;

/// Manually trigger a feed poll cycle
#[utoipa::path(
    post,
    path = "/api/scheduler/poll",
    tag = "scheduler",
    responses(
        (status = 200, description = "Poll cycle completed")
    )
)]
pub async fn trigger_poll(State(state): State<AppState>) -> AppResult<&'static str> {
    tracing::info!("Manually triggering feed poll");

    state
        .poll_job
        .execute()
        .await
        .map_err(|e| AppError::internal(e.to_string()))?;

    Ok("Poll cycle completed")
}

/// Manually trigger a retention sweep
#[utoipa::path(
    post,
    path = "/api/scheduler/sweep",
    tag = "scheduler",
    responses(
        (status = 200, description = "Retention sweep completed")
    )
)]
pub async fn trigger_sweep(State(state): State<AppState>) -> AppResult<&'static str> {
    tracing::info!("Manually triggering retention sweep");

    state
        .sweep_job
        .execute()
        .await
        .map_err(|e| AppError::internal(e.to_string()))?;

    Ok("Retention sweep completed")
}
