//! HTTP API tests against an in-process router with mock services.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use cinescout_core::library::{AddMovieResponse, LibraryError};
use common::{fixtures, TestFixture};

// =============================================================================
// Health, config and settings
// =============================================================================

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/health").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_hides_api_keys() {
    let fixture = TestFixture::new().await;
    fixture
        .put(
            "/api/v1/settings",
            json!({ "library_api_key": "secret-radarr", "tmdb_api_key": "secret-tmdb" }),
        )
        .await;

    let response = fixture.get("/api/v1/config").await;

    assert_status!(response, StatusCode::OK);
    assert!(!response.text.contains("secret-radarr"));
    assert!(!response.text.contains("secret-tmdb"));
    assert_eq!(response.body["connection"]["library_api_key_configured"], true);
    assert_eq!(response.body["discovery"]["minimum_votes"], 50);
}

#[tokio::test]
async fn test_update_settings_persists_partial_update() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .put(
            "/api/v1/settings",
            json!({ "library_url": "http://radarr.local:7878/" }),
        )
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["library_url"], "http://radarr.local:7878");
    assert_eq!(response.body["root_folder_path"], "/data/media/movies/");
    assert_eq!(response.body["tmdb_api_key_configured"], false);

    let saved = std::fs::read_to_string(&fixture.config_path).expect("config written");
    assert!(saved.contains("http://radarr.local:7878"));

    let response = fixture.get("/api/v1/settings").await;
    assert_eq!(response.body["library_url"], "http://radarr.local:7878");
}

#[tokio::test]
async fn test_update_settings_rejects_invalid_values() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .put("/api/v1/settings", json!({ "root_folder_path": "  " }))
        .await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("root_folder_path"));
    assert!(!fixture.config_path.exists());

    let response = fixture.get("/api/v1/settings").await;
    assert_eq!(response.body["root_folder_path"], "/data/media/movies/");
}

// =============================================================================
// Library
// =============================================================================

#[tokio::test]
async fn test_library_refresh() {
    let fixture = TestFixture::with_library(&["Amélie (2001)", "Inception"]).await;

    let response = fixture.get("/api/v1/library").await;
    assert!(response.body["items"].as_array().unwrap().is_empty());

    let response = fixture.post_empty("/api/v1/library/refresh").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "success");
    let names: Vec<&str> = response.body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Amelie", "Inception"]);
}

#[tokio::test]
async fn test_library_refresh_failure_is_bad_gateway() {
    let fixture = TestFixture::with_library(&["Inception"]).await;
    fixture
        .library
        .set_next_error(LibraryError::ApiError {
            status: 401,
            message: "Unauthorized".to_string(),
        })
        .await;

    let response = fixture.post_empty("/api/v1/library/refresh").await;

    assert_status!(response, StatusCode::BAD_GATEWAY);
    assert!(response.body["error"].as_str().unwrap().contains("401"));
}

// =============================================================================
// Discovery
// =============================================================================

async fn fixture_with_seed() -> TestFixture {
    let fixture = TestFixture::with_library(&["Inception"]).await;
    fixture
        .graph
        .add_seed(
            fixtures::tmdb_movie(27205, "Inception", 2010),
            vec![
                fixtures::candidate(329865, "Arrival", 8.0, 500),
                fixtures::candidate(2, "Obscure", 8.0, 3),
            ],
        )
        .await;
    fixture.post_empty("/api/v1/library/refresh").await;
    fixture
}

#[tokio::test]
async fn test_start_and_results() {
    let fixture = fixture_with_seed().await;

    let response = fixture
        .post("/api/v1/discovery/start", json!({ "names": ["Inception"] }))
        .await;

    assert_status!(response, StatusCode::ACCEPTED);
    assert_eq!(response.body["running"], true);
    assert_eq!(response.body["seeds"], 1);

    fixture.wait_for_first_pass().await;

    let response = fixture.get("/api/v1/discovery/results").await;
    assert_status!(response, StatusCode::OK);
    let results = response.body.as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["name"], "Arrival");
    assert_eq!(results[0]["seed_title"], "Inception");

    let response = fixture.get("/api/v1/discovery/status").await;
    assert_eq!(response.body["continuation"], "found");
    assert_eq!(response.body["results"], 1);
    assert_eq!(response.body["library_items"], 1);
}

#[tokio::test]
async fn test_start_without_library_seeds_is_bad_request() {
    let fixture = fixture_with_seed().await;

    let response = fixture
        .post("/api/v1/discovery/start", json!({ "names": ["Tenet"] }))
        .await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "No library movies selected");
    assert_eq!(fixture.get("/api/v1/discovery/status").await.body["running"], false);
}

#[tokio::test]
async fn test_stop_and_load_more() {
    let fixture = fixture_with_seed().await;
    fixture
        .post("/api/v1/discovery/start", json!({ "names": ["Inception"] }))
        .await;
    fixture.wait_for_first_pass().await;

    let response = fixture.post_empty("/api/v1/discovery/stop").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(fixture.get("/api/v1/discovery/status").await.body["running"], false);

    // Results survive a stop, and a pass requested while stopped does nothing.
    let searches = fixture.graph.search_count().await;
    let response = fixture.post_empty("/api/v1/discovery/more").await;
    assert_status!(response, StatusCode::ACCEPTED);
    fixture.engine.run_pass().await;

    assert_eq!(fixture.graph.search_count().await, searches);
    assert_eq!(
        fixture
            .get("/api/v1/discovery/results")
            .await
            .body
            .as_array()
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_add_recommendation() {
    let fixture = fixture_with_seed().await;
    fixture
        .post("/api/v1/discovery/start", json!({ "names": ["Inception"] }))
        .await;
    fixture.wait_for_first_pass().await;

    let response = fixture
        .post(
            "/api/v1/discovery/add",
            json!({ "name": "Arrival", "year": "2016" }),
        )
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["outcome"], "added");
    let requests = fixture.library.add_requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].tmdb_id, 329865);

    let results = fixture.get("/api/v1/discovery/results").await.body;
    assert_eq!(results[0]["status"], "added");
}

#[tokio::test]
async fn test_add_rejected_as_invalid_path() {
    let fixture = TestFixture::new().await;
    fixture
        .graph
        .add_search_result(fixtures::tmdb_movie(329865, "Arrival", 2016))
        .await;
    fixture
        .library
        .set_add_response(AddMovieResponse::rejected("Invalid Path: '/nowhere'"))
        .await;

    let response = fixture
        .post(
            "/api/v1/discovery/add",
            json!({ "name": "Arrival", "year": "2016" }),
        )
        .await;

    assert_eq!(response.body["outcome"], "invalid_path");
}

#[tokio::test]
async fn test_add_without_match() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/api/v1/discovery/add", json!({ "name": "Nothing Like It" }))
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["outcome"], "failed_no_match");
    assert!(fixture.library.add_requests().await.is_empty());
}

#[tokio::test]
async fn test_add_requires_name() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/api/v1/discovery/add", json!({ "name": " ", "year": "2016" }))
        .await;

    assert_status!(response, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Metrics
// =============================================================================

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = fixture_with_seed().await;

    let response = fixture.get("/metrics").await;

    assert_status!(response, StatusCode::OK);
    assert!(response.text.contains("cinescout_library_items"));
    assert!(response.text.contains("cinescout_discovery_running"));
}
