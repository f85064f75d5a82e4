//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use tracing::{error, info};

use crate::{
    engagement::ScrollMetrics,
    state::{AppState, PageViewInit, PageViewSnapshot},
};
use super::responses::{ConfigResponse, HealthResponse, StatusResponse};

/// Handle POST /pageviews - Register a page view and start its timers
pub async fn create_page_view_handler(
    State(state): State<Arc<AppState>>,
    Json(init): Json<PageViewInit>,
) -> Result<(StatusCode, Json<PageViewSnapshot>), StatusCode> {
    match state.start_page_view(init) {
        Ok(snapshot) => {
            info!("Page view {} registered for {}", snapshot.id, snapshot.url);
            Ok((StatusCode::CREATED, Json(snapshot)))
        }
        Err(e) => {
            error!("Failed to register page view: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /pageviews/:id/scroll - Report a scroll measurement
pub async fn scroll_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(metrics): Json<ScrollMetrics>,
) -> Result<Json<PageViewSnapshot>, StatusCode> {
    match state.scroll_page_view(id, &metrics) {
        Ok(Some(snapshot)) => Ok(Json(snapshot)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            error!("Failed to record scroll for page view {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /pageviews/:id - Inspect a page view's engagement flags
pub async fn get_page_view_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<PageViewSnapshot>, StatusCode> {
    match state.get_page_view(id) {
        Ok(Some(snapshot)) => Ok(Json(snapshot)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            error!("Failed to read page view {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle DELETE /pageviews/:id - Stop tracking a page view
pub async fn close_page_view_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<PageViewSnapshot>, StatusCode> {
    match state.close_page_view(id) {
        Ok(Some(snapshot)) => Ok(Json(snapshot)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            error!("Failed to close page view {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /config - Selectors and thresholds for the host snippet
pub async fn config_handler(State(state): State<Arc<AppState>>) -> Json<ConfigResponse> {
    Json(ConfigResponse::from(&state.settings))
}

/// Handle GET /status - Return current server status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        active_page_views: state.active_page_views(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
