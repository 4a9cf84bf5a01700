use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cinescout_core::{
    load_config, save_config, shared_connection, validate_config, DiscoveryEngine, LibraryService,
    RadarrClient, RecommendationGraph, TmdbClient,
};
use cinescout_server::api::create_router;
use cinescout_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());

    // LOG_FORMAT=json switches to structured output
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json");
    let (json_layer, text_layer) = if json {
        (Some(tracing_subscriber::fmt::layer().json()), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer()))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

async fn run() -> Result<()> {
    init_tracing();

    // Determine config path
    let config_path = std::env::var("CINESCOUT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    // Persist the effective configuration so the settings page starts from it
    save_config(&config_path, &config)
        .with_context(|| format!("Failed to write config to {:?}", config_path))?;

    info!("Configuration loaded successfully");
    info!("Library service: {}", config.connection.library_url);
    if config.library.dry_run {
        warn!("Dry run enabled: movies will not actually be added");
    }

    let connection = shared_connection(config.connection.clone());

    let library: Arc<dyn LibraryService> = Arc::new(
        RadarrClient::new(&config.library, Arc::clone(&connection))
            .context("Failed to create Radarr client")?,
    );
    let graph: Arc<dyn RecommendationGraph> = Arc::new(
        TmdbClient::new(&config.tmdb, Arc::clone(&connection))
            .context("Failed to create TMDB client")?,
    );

    let engine = Arc::new(DiscoveryEngine::new(
        &config,
        library,
        graph,
        Arc::clone(&connection),
    ));
    info!("Discovery engine initialized");

    if config.discovery.auto_start {
        let delay = Duration::from_secs(config.discovery.auto_start_delay_secs);
        info!("Auto start scheduled in {:?}", delay);
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = engine.auto_start().await {
                error!("Auto start failed: {}", e);
            }
        });
    }

    let state = Arc::new(AppState::new(
        config.clone(),
        Some(config_path),
        Arc::clone(&engine),
        connection,
    ));

    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    engine.stop();

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
