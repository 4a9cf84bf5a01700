use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;
use tracing::info;

use super::{types::Config, ConfigError};

/// Environment prefix; sections are separated by a double underscore,
/// e.g. `CINESCOUT_DISCOVERY__MINIMUM_VOTES=100`.
const ENV_PREFIX: &str = "CINESCOUT_";

/// Load configuration: built-in defaults, then the TOML file (if present),
/// then environment variable overrides.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if path.exists() {
        info!("Loading configuration file {:?}", path);
    } else {
        info!("No configuration file at {:?}, using defaults", path);
    }

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Persist the effective configuration as TOML.
pub fn save_config(path: &Path, config: &Config) -> Result<(), ConfigError> {
    let contents =
        toml::to_string_pretty(config).map_err(|e| ConfigError::WriteError(e.to_string()))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::WriteError(format!("{}: {}", parent.display(), e)))?;
        }
    }

    std::fs::write(path, contents)
        .map_err(|e| ConfigError::WriteError(format!("{}: {}", path.display(), e)))
}
