use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Library and TMDB timeouts are positive
/// - Minimum rating is within TMDB's 0-10 scale
/// - Language is "all" or a two-letter ISO 639-1 code
/// - Root folder path is set
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.library.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "library.timeout_secs must be greater than 0".to_string(),
        ));
    }

    if config.tmdb.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "tmdb.timeout_secs must be greater than 0".to_string(),
        ));
    }

    let rating = config.discovery.minimum_rating;
    if !(0.0..=10.0).contains(&rating) {
        return Err(ConfigError::ValidationError(format!(
            "discovery.minimum_rating must be between 0 and 10, got {}",
            rating
        )));
    }

    let language = config.discovery.language.as_str();
    let is_iso_code = language.len() == 2 && language.chars().all(|c| c.is_ascii_lowercase());
    if language != "all" && !is_iso_code {
        return Err(ConfigError::ValidationError(format!(
            "discovery.language must be \"all\" or a two-letter language code, got {:?}",
            language
        )));
    }

    if config.connection.root_folder_path.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "connection.root_folder_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
