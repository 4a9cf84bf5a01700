use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use cinescout_core::config::{ConnectionUpdate, SanitizedConnection};
use cinescout_core::{ConfigError, SanitizedConfig};

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config().await)
}

pub async fn get_settings(State(state): State<Arc<AppState>>) -> Json<SanitizedConnection> {
    Json(state.settings().await)
}

/// Update connection settings and persist them.
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(update): Json<ConnectionUpdate>,
) -> Result<Json<SanitizedConnection>, (StatusCode, Json<ErrorResponse>)> {
    state.update_settings(&update).await.map(Json).map_err(|e| {
        let status = match e {
            ConfigError::ValidationError(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ErrorResponse::new(e.to_string())))
    })
}

/// Prometheus text exposition.
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state).await;
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
