use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fixer_core::{
    create_authenticator, load_config, validate_config, Authenticator, BridgeContext,
    CampaignStore, FixerClient, HttpFixerClient, SnapshotStore, SnapshotThrottle,
    SqliteCampaignStore, SqliteSnapshotStore, SystemClock,
};
use fixer_server::api::create_router;
use fixer_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("FIXER_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        version = VERSION,
        config_hash = &config_hash[..16],
        "Configuration loaded successfully"
    );
    info!("Auth method: {:?}", config.auth.method);
    info!("Database path: {:?}", config.database.path);

    // Create authenticator
    let authenticator: Arc<dyn Authenticator> = Arc::from(
        create_authenticator(&config.auth).context("Failed to create authenticator")?,
    );
    info!("Using authenticator: {}", authenticator.method_name());

    // Stores share one SQLite file
    let campaigns: Arc<dyn CampaignStore> = Arc::new(
        SqliteCampaignStore::new(&config.database.path)
            .context("Failed to create campaign store")?,
    );
    let snapshots: Arc<dyn SnapshotStore> = Arc::new(
        SqliteSnapshotStore::new(&config.database.path)
            .context("Failed to create snapshot store")?,
    );
    info!("Campaign and snapshot stores initialized");

    // Ordering engine client
    let fixer: Arc<dyn FixerClient> = Arc::new(
        HttpFixerClient::new(&config.engine).context("Failed to create ordering engine client")?,
    );
    info!("Ordering engine at {}", config.engine.url);

    let throttle = Arc::new(SnapshotThrottle::new(Duration::from_secs(
        config.snapshots.interval_secs,
    )));
    info!(
        "Snapshot throttle interval: {}s",
        config.snapshots.interval_secs
    );

    let bridge = Arc::new(BridgeContext::new(
        fixer,
        campaigns,
        snapshots,
        throttle,
        Arc::new(SystemClock),
        config.defaults.clone(),
    ));

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, authenticator, bridge));
    let app = create_router(state);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

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
            Ok(mut sigterm) => {
                sigterm.recv().await;
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

    info!("Shutdown signal received");
}
