//! Library and discovery API handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use cinescout_core::{
    AddOutcome, DiscoveryError, DiscoveryStatus, LibraryReport, Recommendation,
};

use super::handlers::ErrorResponse;
use crate::state::AppState;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub names: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddRequest {
    pub name: String,
    /// Release year, or "0000" when unknown.
    #[serde(default)]
    pub year: String,
}

#[derive(Debug, Serialize)]
pub struct AddResponse {
    pub name: String,
    pub year: String,
    pub outcome: AddOutcome,
}

/// Simple message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn error_response(e: DiscoveryError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match e {
        DiscoveryError::NoSeedsSelected => StatusCode::BAD_REQUEST,
        DiscoveryError::Library(_) | DiscoveryError::Catalog(_) => StatusCode::BAD_GATEWAY,
    };
    (status, Json(ErrorResponse::new(e.to_string())))
}

// ============================================================================
// Library
// ============================================================================

/// Current library snapshot (no contact with the library service).
pub async fn get_library(State(state): State<Arc<AppState>>) -> Json<LibraryReport> {
    Json(state.engine().library_snapshot().await)
}

/// Reload the library snapshot from the library service.
pub async fn refresh_library(State(state): State<Arc<AppState>>) -> ApiResult<LibraryReport> {
    state
        .engine()
        .refresh_library(false)
        .await
        .map_err(error_response)?;
    Ok(Json(state.engine().library_snapshot().await))
}

// ============================================================================
// Discovery
// ============================================================================

/// Start a run; the first pass continues in the background.
pub async fn start(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartRequest>,
) -> Result<(StatusCode, Json<DiscoveryStatus>), (StatusCode, Json<ErrorResponse>)> {
    // The first pass runs detached; observers follow it through events.
    let _pass = state
        .engine()
        .start(&request.names)
        .await
        .map_err(error_response)?;
    debug!("Discovery started with {} names", request.names.len());
    Ok((StatusCode::ACCEPTED, Json(state.engine().status().await)))
}

pub async fn stop(State(state): State<Arc<AppState>>) -> Json<MessageResponse> {
    state.engine().stop();
    Json(MessageResponse {
        message: "Discovery stopped".to_string(),
    })
}

/// Request another pass. Ignored while a pass is already running.
pub async fn load_more(State(state): State<Arc<AppState>>) -> (StatusCode, Json<MessageResponse>) {
    state.engine().load_more();
    (
        StatusCode::ACCEPTED,
        Json(MessageResponse {
            message: "Search requested".to_string(),
        }),
    )
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<DiscoveryStatus> {
    Json(state.engine().status().await)
}

pub async fn get_results(State(state): State<Arc<AppState>>) -> Json<Vec<Recommendation>> {
    Json(state.engine().results().await)
}

/// Add a title to the library.
pub async fn add(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AddRequest>,
) -> ApiResult<AddResponse> {
    if request.name.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("name must not be empty")),
        ));
    }
    let outcome = state
        .engine()
        .add_title(&request.name, &request.year)
        .await;
    Ok(Json(AddResponse {
        name: request.name,
        year: request.year,
        outcome,
    }))
}
