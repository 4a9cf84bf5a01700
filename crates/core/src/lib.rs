pub mod config;
pub mod discovery;
pub mod external_catalog;
pub mod library;
pub mod metrics;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, save_config, shared_connection, validate_config, Config,
    ConfigError, ConnectionSettings, SanitizedConfig, SharedConnection,
};
pub use discovery::{
    AddOutcome, DiscoveryEngine, DiscoveryError, DiscoveryEvent, DiscoveryStatus, LibraryReport,
    PassOutcome, Recommendation,
};
pub use external_catalog::{ExternalCatalogError, RecommendationGraph, TmdbClient};
pub use library::{LibraryError, LibraryService, RadarrClient};
