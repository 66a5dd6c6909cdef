//! Initialization helpers for the application startup.

use crate::auth::{AuthService, GithubClient, GithubEndpoints, SessionStore};
use crate::config::{CacheBackend, Config, LogFormat};
use crate::db::UserDb;
use crate::store::{CacheStore, FileStore, MemoryStore};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// Sets up the tracing subscriber with the configured filters.
pub fn setup_logging(config: &Config) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let mut filter = config.logging.level.clone();

        // Keep HTTP plumbing quiet unless explicitly enabled/overridden
        for noisy in ["hyper", "hyper_util", "reqwest", "rustls"] {
            if !filter.contains(noisy) {
                filter.push_str(&format!(",{}=warn", noisy));
            }
        }

        tracing_subscriber::EnvFilter::new(filter)
    });

    let builder = tracing_subscriber::fmt().with_env_filter(env_filter);
    // try_init: tests may have installed a subscriber already
    let _ = match config.logging.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
}

/// Builds the configured cache store.
pub async fn init_store(config: &Config) -> Result<Arc<dyn CacheStore>> {
    match config.cache.backend {
        CacheBackend::Memory => {
            info!("Using in-memory proxy list cache.");
            Ok(Arc::new(MemoryStore::new()))
        }
        CacheBackend::File => {
            info!(
                "Using file-backed proxy list cache in {}",
                config.cache.data_dir.display()
            );
            let store = FileStore::open(&config.cache.data_dir)
                .await
                .context("Failed to open cache directory")?;
            Ok(Arc::new(store))
        }
    }
}

/// Initializes GitHub login when client credentials are configured.
pub fn init_auth(config: &Config) -> Result<Option<Arc<AuthService>>> {
    let auth = &config.auth;
    let (Some(client_id), Some(client_secret)) = (
        auth.github_client_id.clone(),
        auth.github_client_secret.clone(),
    ) else {
        warn!("GitHub client id/secret not set; login routes disabled.");
        return Ok(None);
    };

    let secret = match &auth.session_secret {
        Some(secret) => secret.clone(),
        None => {
            warn!(
                "SESSION_SECRET not set; session cookies are signed with a random per-process key."
            );
            uuid::Uuid::new_v4().to_string()
        }
    };

    let users = UserDb::open(&auth.database_path).context("Failed to open user database")?;
    users
        .initialize()
        .context("Failed to initialize user database")?;

    let http = reqwest::Client::builder()
        .user_agent(concat!("ProxyShelf/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    let github = GithubClient::new(
        http,
        client_id,
        client_secret,
        auth.callback_url.clone(),
        GithubEndpoints::default(),
    );

    let sessions = SessionStore::new(secret)
        .context("Failed to set up session store")?
        .with_max_age(auth.session_max_age());

    info!("GitHub login enabled (callback {})", auth.callback_url);
    Ok(Some(Arc::new(AuthService::new(
        github,
        Arc::new(users),
        sessions,
    ))))
}
