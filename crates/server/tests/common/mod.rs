//! Common test utilities for API testing with mocks.
//!
//! Builds an in-process router around a discovery engine wired to mock
//! library and recommendation services, so the HTTP surface can be tested
//! without Radarr or TMDB.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use cinescout_core::{
    config::ServerConfig,
    discovery::Continuation,
    shared_connection,
    testing::{MockLibraryService, MockRecommendationGraph},
    Config, DiscoveryEngine,
};
use cinescout_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use cinescout_core::testing::fixtures;

/// Test fixture with an in-process router and controllable mocks.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_health() {
///     let fixture = TestFixture::new().await;
///     let response = fixture.get("/api/v1/health").await;
///     assert_eq!(response.status, StatusCode::OK);
/// }
/// ```
pub struct TestFixture {
    pub router: Router,
    pub engine: Arc<DiscoveryEngine>,
    /// Mock library service - configure library contents and add responses
    pub library: Arc<MockLibraryService>,
    /// Mock recommendation graph - configure seeds and recommendations
    pub graph: Arc<MockRecommendationGraph>,
    /// Where settings updates are written
    pub config_path: PathBuf,
    /// Holds the config file alive for the test
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    pub async fn new() -> Self {
        Self::with_library(&[]).await
    }

    /// Create a fixture whose library holds the given titles (all from 2010).
    pub async fn with_library(titles: &[&str]) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("config.toml");

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 5000, // Not bound; validation rejects 0
            },
            ..Default::default()
        };

        let library = Arc::new(MockLibraryService::new());
        library
            .set_movies(
                titles
                    .iter()
                    .map(|title| fixtures::library_movie(title, 2010))
                    .collect(),
            )
            .await;
        let graph = Arc::new(MockRecommendationGraph::new());

        let connection = shared_connection(config.connection.clone());
        let engine = Arc::new(DiscoveryEngine::new(
            &config,
            library.clone(),
            graph.clone(),
            Arc::clone(&connection),
        ));

        let state = Arc::new(AppState::new(
            config,
            Some(config_path.clone()),
            Arc::clone(&engine),
            connection,
        ));
        let router = create_router(state);

        Self {
            router,
            engine,
            library,
            graph,
            config_path,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a PUT request with JSON body.
    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body)).await
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }

    /// Wait until the first pass of a run has finished.
    pub async fn wait_for_first_pass(&self) {
        loop {
            let status = self.engine.status().await;
            if status.continuation != Continuation::NotStarted && !status.search_in_progress {
                return;
            }
            tokio::task::yield_now().await;
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status, $response.status, $response.text
        );
    };
}
