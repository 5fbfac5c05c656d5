//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use tracing::{info, warn};

use crate::{
    error::TimerError,
    state::{AppState, TimerId, TimerProps, TimerView},
};
use super::{
    requests::{AddSecondsRequest, EndTimeRequest, TimerPropsPatch},
    responses::{ApiResponse, HealthResponse, StatusResponse},
};

fn error_status(e: TimerError) -> StatusCode {
    warn!("Request failed: {}", e);
    match e {
        TimerError::UnknownTimer(_) => StatusCode::NOT_FOUND,
        TimerError::InvalidEndTime { .. } => StatusCode::BAD_REQUEST,
    }
}

/// Run a timer operation and wrap the resulting snapshot
fn timer_action<F>(state: &AppState, id: TimerId, action: &str, operation: F) -> Result<Json<ApiResponse>, StatusCode>
where
    F: FnOnce(&TimerView),
{
    let snapshot = state
        .update_timer(id, action, operation)
        .map_err(error_status)?;
    info!("Timer {} {}", id, action);
    Ok(Json(ApiResponse::ok(format!("Timer {} {}", id, action), snapshot)))
}

/// Handle POST /timers - Mount a timer with the given props
pub async fn mount_handler(
    State(state): State<Arc<AppState>>,
    Json(props): Json<TimerProps>,
) -> Json<ApiResponse> {
    let snapshot = state.mount_timer(&props);
    Json(ApiResponse::ok(format!("Timer {} mounted", snapshot.id), snapshot))
}

/// Handle GET /timers - Return every mounted timer and scheduler status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        timers: state.timer_snapshots(),
        ticking: state.context.is_ticking(),
        in_background: state.context.is_in_background(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /timers/:id - Return one timer
pub async fn timer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TimerId>,
) -> Result<Json<ApiResponse>, StatusCode> {
    let snapshot = state.timer_snapshot(id).map_err(error_status)?;
    Ok(Json(ApiResponse::ok(format!("Timer {}", id), snapshot)))
}

/// Handle PATCH /timers/:id - Apply a partial props update
pub async fn patch_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TimerId>,
    Json(patch): Json<TimerPropsPatch>,
) -> Result<Json<ApiResponse>, StatusCode> {
    timer_action(&state, id, "updated", |view| patch.apply_to(view))
}

/// Handle DELETE /timers/:id - Unmount a timer
pub async fn unmount_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TimerId>,
) -> Result<Json<ApiResponse>, StatusCode> {
    state.unmount_timer(id).map_err(error_status)?;
    Ok(Json(ApiResponse::done(format!("Timer {} unmounted", id))))
}

/// Handle POST /timers/:id/start
pub async fn start_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TimerId>,
) -> Result<Json<ApiResponse>, StatusCode> {
    timer_action(&state, id, "started", TimerView::start)
}

/// Handle POST /timers/:id/pause
pub async fn pause_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TimerId>,
) -> Result<Json<ApiResponse>, StatusCode> {
    timer_action(&state, id, "paused", TimerView::pause)
}

/// Handle POST /timers/:id/resume
pub async fn resume_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TimerId>,
) -> Result<Json<ApiResponse>, StatusCode> {
    timer_action(&state, id, "resumed", TimerView::resume)
}

/// Handle POST /timers/:id/reset
pub async fn reset_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TimerId>,
) -> Result<Json<ApiResponse>, StatusCode> {
    timer_action(&state, id, "reset", TimerView::reset)
}

/// Handle POST /timers/:id/add-seconds - Shift the end time
pub async fn add_seconds_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TimerId>,
    Json(request): Json<AddSecondsRequest>,
) -> Result<Json<ApiResponse>, StatusCode> {
    timer_action(&state, id, "shifted", |view| view.add_seconds(request.seconds))
}

/// Handle POST /timers/:id/end-time - Set a new end time.
/// Unparseable timestamps are accepted and leave the timer idle.
pub async fn end_time_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TimerId>,
    Json(request): Json<EndTimeRequest>,
) -> Result<Json<ApiResponse>, StatusCode> {
    timer_action(&state, id, "retargeted", |view| view.set_end_time(&request.end_time))
}

/// Handle POST /app/background - Simulate the app entering the background
pub async fn background_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    state.enter_background();
    Json(ApiResponse::done("App entered background".to_string()))
}

/// Handle POST /app/foreground - Simulate the app returning to the foreground
pub async fn foreground_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    state.enter_foreground();
    Json(ApiResponse::done("App entered foreground".to_string()))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
