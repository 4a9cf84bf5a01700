use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use super::{discovery, handlers, middleware::metrics_middleware, ws};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Front-end static files path (configurable via env)
    let static_dir = std::env::var("STATIC_DIR").unwrap_or_else(|_| "static".to_string());

    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route(
            "/settings",
            get(handlers::get_settings).put(handlers::update_settings),
        )
        // Library snapshot
        .route("/library", get(discovery::get_library))
        .route("/library/refresh", post(discovery::refresh_library))
        // Discovery
        .route("/discovery/start", post(discovery::start))
        .route("/discovery/stop", post(discovery::stop))
        .route("/discovery/more", post(discovery::load_more))
        .route("/discovery/status", get(discovery::get_status))
        .route("/discovery/results", get(discovery::get_results))
        .route("/discovery/add", post(discovery::add))
        .layer(middleware::from_fn(metrics_middleware))
        .with_state(state.clone());

    // Serve front-end with SPA fallback
    let index_path = format!("{}/index.html", static_dir);
    let serve_dir = ServeDir::new(&static_dir).fallback(ServeFile::new(&index_path));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        .fallback_service(serve_dir)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
