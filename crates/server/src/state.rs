use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use cinescout_core::config::{ConnectionUpdate, SanitizedConnection};
use cinescout_core::{
    save_config, validate_config, Config, ConfigError, DiscoveryEngine, SanitizedConfig,
    SharedConnection,
};

/// Shared application state
pub struct AppState {
    config: RwLock<Config>,
    /// Where settings updates are persisted; `None` keeps them in memory.
    config_path: Option<PathBuf>,
    engine: Arc<DiscoveryEngine>,
    connection: SharedConnection,
}

impl AppState {
    pub fn new(
        config: Config,
        config_path: Option<PathBuf>,
        engine: Arc<DiscoveryEngine>,
        connection: SharedConnection,
    ) -> Self {
        Self {
            config: RwLock::new(config),
            config_path,
            engine,
            connection,
        }
    }

    pub fn engine(&self) -> &Arc<DiscoveryEngine> {
        &self.engine
    }

    pub async fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&*self.config.read().await)
    }

    pub async fn settings(&self) -> SanitizedConnection {
        SanitizedConnection::from(&*self.connection.read().await)
    }

    /// Apply a connection update, validate it, and persist the config.
    ///
    /// Both clients and the add workflow see the new values on their next call.
    pub async fn update_settings(
        &self,
        update: &ConnectionUpdate,
    ) -> Result<SanitizedConnection, ConfigError> {
        let mut config = self.config.write().await;

        let mut candidate = config.clone();
        update.apply(&mut candidate.connection);
        validate_config(&candidate)?;

        if let Some(path) = &self.config_path {
            save_config(path, &candidate)?;
        }
        *self.connection.write().await = candidate.connection.clone();
        *config = candidate;

        info!("Connection settings updated");
        Ok(SanitizedConnection::from(&config.connection))
    }
}
