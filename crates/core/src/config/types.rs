use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub connection: ConnectionSettings,
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub tmdb: TmdbConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    5000
}

/// Connection settings that can be changed while the service runs.
///
/// Both HTTP clients read these on every request, so an update through
/// [`SharedConnection`] applies to the next call without a restart.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConnectionSettings {
    /// Radarr base URL (e.g., "http://localhost:7878")
    #[serde(default = "default_library_url")]
    pub library_url: String,
    /// Radarr API key
    #[serde(default)]
    pub library_api_key: String,
    /// Root folder new movies are placed under
    #[serde(default = "default_root_folder_path")]
    pub root_folder_path: String,
    /// TMDB API key
    #[serde(default)]
    pub tmdb_api_key: String,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            library_url: default_library_url(),
            library_api_key: String::new(),
            root_folder_path: default_root_folder_path(),
            tmdb_api_key: String::new(),
        }
    }
}

fn default_library_url() -> String {
    "http://192.168.1.2:7878".to_string()
}

fn default_root_folder_path() -> String {
    "/data/media/movies/".to_string()
}

/// Connection settings shared between the clients and the add workflow.
pub type SharedConnection = Arc<RwLock<ConnectionSettings>>;

/// Wrap connection settings for sharing.
pub fn shared_connection(settings: ConnectionSettings) -> SharedConnection {
    Arc::new(RwLock::new(settings))
}

/// Partial update of [`ConnectionSettings`]; absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConnectionUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_folder_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmdb_api_key: Option<String>,
}

impl ConnectionUpdate {
    pub fn apply(&self, settings: &mut ConnectionSettings) {
        if let Some(url) = &self.library_url {
            settings.library_url = url.trim_end_matches('/').to_string();
        }
        if let Some(key) = &self.library_api_key {
            settings.library_api_key = key.clone();
        }
        if let Some(path) = &self.root_folder_path {
            settings.root_folder_path = path.clone();
        }
        if let Some(key) = &self.tmdb_api_key {
            settings.tmdb_api_key = key.clone();
        }
    }
}

/// Radarr behaviour when adding movies
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryConfig {
    /// Request timeout in seconds (default: 120)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_profile_id")]
    pub quality_profile_id: u32,
    #[serde(default = "default_profile_id")]
    pub metadata_profile_id: u32,
    /// Ask Radarr to search for the movie right after adding it
    #[serde(default)]
    pub search_on_add: bool,
    /// Pretend every add succeeded without calling Radarr
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            quality_profile_id: default_profile_id(),
            metadata_profile_id: default_profile_id(),
            search_on_add: false,
            dry_run: false,
        }
    }
}

fn default_timeout() -> u64 {
    120
}

fn default_profile_id() -> u32 {
    1
}

/// TMDB client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TmdbConfig {
    /// Base URL (default: https://api.themoviedb.org/3).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Image base URL for posters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base_url: Option<String>,
    /// Use the first search result when nothing matches closely enough.
    #[serde(default)]
    pub fallback_to_top_result: bool,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_tmdb_timeout")]
    pub timeout_secs: u64,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            image_base_url: None,
            fallback_to_top_result: false,
            timeout_secs: default_tmdb_timeout(),
        }
    }
}

fn default_tmdb_timeout() -> u64 {
    30
}

/// Recommendation filtering and startup behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscoveryConfig {
    #[serde(default = "default_minimum_rating")]
    pub minimum_rating: f32,
    #[serde(default = "default_minimum_votes")]
    pub minimum_votes: u32,
    /// "all" or an ISO 639-1 code such as "en"
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub auto_start: bool,
    #[serde(default = "default_auto_start_delay")]
    pub auto_start_delay_secs: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            minimum_rating: default_minimum_rating(),
            minimum_votes: default_minimum_votes(),
            language: default_language(),
            auto_start: false,
            auto_start_delay_secs: default_auto_start_delay(),
        }
    }
}

fn default_minimum_rating() -> f32 {
    5.5
}

fn default_minimum_votes() -> u32 {
    50
}

fn default_language() -> String {
    "all".to_string()
}

fn default_auto_start_delay() -> u64 {
    60
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub connection: SanitizedConnection,
    pub library: LibraryConfig,
    pub tmdb: TmdbConfig,
    pub discovery: DiscoveryConfig,
}

/// Connection settings with API keys hidden
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConnection {
    pub library_url: String,
    pub library_api_key_configured: bool,
    pub root_folder_path: String,
    pub tmdb_api_key_configured: bool,
}

impl From<&ConnectionSettings> for SanitizedConnection {
    fn from(connection: &ConnectionSettings) -> Self {
        Self {
            library_url: connection.library_url.clone(),
            library_api_key_configured: !connection.library_api_key.is_empty(),
            root_folder_path: connection.root_folder_path.clone(),
            tmdb_api_key_configured: !connection.tmdb_api_key.is_empty(),
        }
    }
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            connection: SanitizedConnection::from(&config.connection),
            library: config.library.clone(),
            tmdb: config.tmdb.clone(),
            discovery: config.discovery.clone(),
        }
    }
}
