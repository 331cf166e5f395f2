//! match-server: Matchmaking Registry Service
//!
//! Game clients advertise lobbies, other clients discover them by game id,
//! and the advertiser keeps its lobby alive with periodic pings. This
//! binary wires configuration, storage and the HTTP endpoint together.

use match_core::{Config, SessionRegistry, SessionStore};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::load().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    tracing::info!("Starting match-server...");
    tracing::info!(
        "Database: {} (session TTL {}s, max {} results per list)",
        config.db_path,
        config.session_ttl_secs,
        config.max_results
    );

    // The default db path lives under data/
    if let Some(parent) = std::path::Path::new(&config.db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let store = SessionStore::new(&config.db_path)
        .map_err(|e| anyhow::anyhow!("Failed to open session store: {}", e))?;
    let registry = SessionRegistry::new(store, &config);

    let port = config.port;
    let server = tokio::spawn(async move {
        if let Err(e) = match_api::start_server(port, registry).await {
            tracing::error!("HTTP server error: {}", e);
        }
    });
    tracing::info!("HTTP server started on port {}", port);
    tracing::info!("Press Ctrl+C to exit");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");

    server.abort();

    tracing::info!("Shutdown complete");
    Ok(())
}
