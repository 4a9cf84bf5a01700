//! Radarr v3 API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{AddMovieRequest, AddMovieResponse, LibraryError, LibraryMovie, LibraryService};
use crate::config::{LibraryConfig, SharedConnection};
use crate::metrics::EXTERNAL_REQUESTS;

/// Radarr client.
///
/// URL and API key come from the shared connection settings on every request.
pub struct RadarrClient {
    client: Client,
    connection: SharedConnection,
}

impl RadarrClient {
    /// Create a new Radarr client.
    pub fn new(config: &LibraryConfig, connection: SharedConnection) -> Result<Self, LibraryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, connection })
    }

    /// Movie endpoint URL and API key.
    async fn endpoint(&self) -> Result<(String, String), LibraryError> {
        let connection = self.connection.read().await;
        let base = connection.library_url.trim_end_matches('/');
        if base.is_empty() {
            return Err(LibraryError::NotConfigured(
                "Radarr address is required".to_string(),
            ));
        }
        Ok((
            format!("{}/api/v3/movie", base),
            connection.library_api_key.clone(),
        ))
    }
}

#[async_trait]
impl LibraryService for RadarrClient {
    async fn list_movies(&self) -> Result<Vec<LibraryMovie>, LibraryError> {
        let (url, api_key) = self.endpoint().await?;

        debug!("Radarr list movies: {}", url);

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", api_key)
            .send()
            .await
            .inspect_err(|_| {
                EXTERNAL_REQUESTS
                    .with_label_values(&["radarr", "error"])
                    .inc();
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            EXTERNAL_REQUESTS
                .with_label_values(&["radarr", "error"])
                .inc();
            let body = response.text().await.unwrap_or_default();
            return Err(LibraryError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let movies: Vec<RadarrMovie> = response
            .json()
            .await
            .map_err(|e| LibraryError::ParseError(format!("Failed to parse movie list: {}", e)))?;

        EXTERNAL_REQUESTS
            .with_label_values(&["radarr", "success"])
            .inc();

        Ok(movies
            .into_iter()
            .map(|m| LibraryMovie::new(m.title, m.year.filter(|y| *y > 0)))
            .collect())
    }

    async fn add_movie(&self, request: &AddMovieRequest) -> Result<AddMovieResponse, LibraryError> {
        let (url, api_key) = self.endpoint().await?;
        let payload = RadarrAddPayload::from(request);

        debug!(
            "Radarr add movie: title='{}', tmdb_id={}",
            request.title, request.tmdb_id
        );

        let response = self
            .client
            .post(&url)
            .header("X-Api-Key", api_key)
            .json(&payload)
            .send()
            .await
            .inspect_err(|_| {
                EXTERNAL_REQUESTS
                    .with_label_values(&["radarr", "error"])
                    .inc();
            })?;

        let status = response.status();
        EXTERNAL_REQUESTS
            .with_label_values(&["radarr", add_result_label(status)])
            .inc();
        if status == StatusCode::CREATED {
            return Ok(AddMovieResponse::created());
        }

        let body = response.text().await.unwrap_or_default();
        let message = rejection_message(&body);
        warn!(
            "Radarr rejected '{}' (HTTP {}): {}",
            request.title, status, message
        );
        Ok(AddMovieResponse::rejected(message))
    }
}

/// Pull the first `errorMessage` out of a Radarr validation error body.
fn rejection_message(body: &str) -> String {
    serde_json::from_str::<Vec<RadarrError>>(body)
        .ok()
        .and_then(|errors| errors.into_iter().find_map(|e| e.error_message))
        .unwrap_or_else(|| "Unknown Error".to_string())
}

/// Metric label for the answer to an add request.
fn add_result_label(status: StatusCode) -> &'static str {
    if status == StatusCode::CREATED {
        "success"
    } else if status.is_client_error() {
        "rejected"
    } else {
        "error"
    }
}

/// Radarr's URL slug for a title.
fn title_slug(title: &str) -> String {
    title.to_lowercase().replace(' ', "-")
}

// ============================================================================
// Radarr API Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct RadarrMovie {
    title: String,
    year: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RadarrError {
    error_message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RadarrAddPayload {
    title: String,
    quality_profile_id: u32,
    metadata_profile_id: u32,
    title_slug: String,
    root_folder_path: String,
    tmdb_id: u32,
    monitored: bool,
    add_options: RadarrAddOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RadarrAddOptions {
    monitor: &'static str,
    search_for_movie: bool,
}

impl From<&AddMovieRequest> for RadarrAddPayload {
    fn from(request: &AddMovieRequest) -> Self {
        Self {
            title: request.title.clone(),
            quality_profile_id: request.quality_profile_id,
            metadata_profile_id: request.metadata_profile_id,
            title_slug: title_slug(&request.title),
            root_folder_path: request.root_folder_path.clone(),
            tmdb_id: request.tmdb_id,
            monitored: true,
            add_options: RadarrAddOptions {
                monitor: "movieOnly",
                search_for_movie: request.search_on_add,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{shared_connection, ConnectionSettings};

    #[test]
    fn test_payload_shape() {
        let request = AddMovieRequest {
            title: "The Prestige".to_string(),
            tmdb_id: 1124,
            quality_profile_id: 4,
            metadata_profile_id: 1,
            root_folder_path: "/movies/".to_string(),
            search_on_add: true,
        };

        let json = serde_json::to_value(RadarrAddPayload::from(&request)).unwrap();
        assert_eq!(json["title"], "The Prestige");
        assert_eq!(json["titleSlug"], "the-prestige");
        assert_eq!(json["qualityProfileId"], 4);
        assert_eq!(json["rootFolderPath"], "/movies/");
        assert_eq!(json["tmdbId"], 1124);
        assert_eq!(json["monitored"], true);
        assert_eq!(json["addOptions"]["monitor"], "movieOnly");
        assert_eq!(json["addOptions"]["searchForMovie"], true);
    }

    #[test]
    fn test_rejection_message_from_validation_body() {
        let body = r#"[{"propertyName":"TmdbId","errorMessage":"This movie has already been added and already exists in the database"}]"#;
        assert_eq!(
            rejection_message(body),
            "This movie has already been added and already exists in the database"
        );
    }

    #[test]
    fn test_rejection_message_unparseable_body() {
        assert_eq!(rejection_message("<html>502</html>"), "Unknown Error");
        assert_eq!(rejection_message("[]"), "Unknown Error");
    }

    #[test]
    fn test_add_result_label() {
        assert_eq!(add_result_label(StatusCode::CREATED), "success");
        assert_eq!(add_result_label(StatusCode::BAD_REQUEST), "rejected");
        assert_eq!(add_result_label(StatusCode::CONFLICT), "rejected");
        assert_eq!(add_result_label(StatusCode::INTERNAL_SERVER_ERROR), "error");
    }

    #[tokio::test]
    async fn test_empty_address_is_not_configured() {
        let connection = shared_connection(ConnectionSettings {
            library_url: String::new(),
            ..Default::default()
        });
        let client = RadarrClient::new(&LibraryConfig::default(), connection).unwrap();

        let result = client.list_movies().await;
        assert!(matches!(result, Err(LibraryError::NotConfigured(_))));
    }
}
