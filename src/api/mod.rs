//! HTTP API module
//!
//! Bridges timer methods and props to HTTP so the component can be driven
//! without a native host.

pub mod handlers;
pub mod requests;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/timers", post(mount_handler).get(status_handler))
        .route(
            "/timers/:id",
            get(timer_handler).patch(patch_handler).delete(unmount_handler),
        )
        .route("/timers/:id/start", post(start_handler))
        .route("/timers/:id/pause", post(pause_handler))
        .route("/timers/:id/resume", post(resume_handler))
        .route("/timers/:id/reset", post(reset_handler))
        .route("/timers/:id/add-seconds", post(add_seconds_handler))
        .route("/timers/:id/end-time", post(end_time_handler))
        .route("/app/background", post(background_handler))
        .route("/app/foreground", post(foreground_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
