use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use proxy_shelf::api::{start_api_server, ApiState};
use proxy_shelf::config::Config;
use proxy_shelf::engine::{HttpFetcher, RefreshState, Scheduler, SourceRegistry, StandardManager};
use proxy_shelf::init::{init_auth, init_store, setup_logging};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load Config (.env first so overrides can come from it)
    dotenv::dotenv().ok();
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    let config_exists = Path::new(&config_path).exists();
    let mut config = if config_exists {
        Config::load(&config_path).await?
    } else {
        Config::default()
    };
    config.apply_env_overrides(|key| std::env::var(key).ok());
    config.validate()?;

    // 2. Setup Logging
    setup_logging(&config);
    info!("Starting proxy-shelf...");

    if !config_exists {
        info!("Config file not found, using defaults.");
    }

    // 3. Source Registry & Cache Store
    let registry = Arc::new(
        SourceRegistry::from_config(&config.sources).context("Invalid [sources] configuration")?,
    );
    let store = init_store(&config).await?;

    // 4. Refresh Manager & Scheduler
    let fetcher = Arc::new(
        HttpFetcher::new(config.updates.fetch_timeout()).context("Failed to build HTTP client")?,
    );
    let manager = Arc::new(StandardManager::new(
        registry.clone(),
        fetcher,
        store.clone(),
        config.updates.concurrent_downloads,
    ));
    let refresh_state = RefreshState::new();
    let scheduler = Scheduler::new(
        manager,
        refresh_state.clone(),
        config.updates.interval(),
        config.updates.align_to_wall_clock,
    );

    // 5. Initial refresh, awaited so the API starts with fresh lists
    scheduler.run_cycle().await;

    // 6. Spawn Periodic Updater; the API can force a cycle through this channel
    let (refresh_tx, refresh_rx) = tokio::sync::mpsc::channel::<()>(1);
    scheduler.spawn(refresh_rx);

    // 7. Identity Gateway (optional)
    let auth = init_auth(&config)?;

    // 8. Start API Server (blocks until Ctrl-C)
    let host = config.host.parse().context("Invalid listen host")?;
    let addr = SocketAddr::new(host, config.port);
    let state = ApiState::new(
        registry,
        store,
        refresh_state,
        refresh_tx,
        config.updates.interval(),
    )
    .with_auth(auth, config.auth.require_login);

    start_api_server(state, addr).await
}
