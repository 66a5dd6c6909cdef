mod assets;
mod auth;
mod error;
mod gate;
mod proxies;

pub use self::error::ApiError;

use crate::auth::AuthService;
use crate::engine::{QueryService, RefreshState, SourceRegistry};
use crate::store::CacheStore;
use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderMap},
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::mpsc::Sender;
use tower_http::trace::TraceLayer;
use tracing::info;

pub struct ApiState {
    pub query: QueryService,
    pub registry: Arc<SourceRegistry>,
    pub store: Arc<dyn CacheStore>,
    pub refresh: RefreshState,
    pub refresh_sender: Sender<()>,
    pub refresh_interval: Duration,
    pub auth: Option<Arc<AuthService>>,
    /// Gate `/api/proxies` behind a GitHub session.
    pub require_login: bool,
}

impl ApiState {
    pub fn new(
        registry: Arc<SourceRegistry>,
        store: Arc<dyn CacheStore>,
        refresh: RefreshState,
        refresh_sender: Sender<()>,
        refresh_interval: Duration,
    ) -> Self {
        Self {
            query: QueryService::new(registry.clone(), store.clone()),
            registry,
            store,
            refresh,
            refresh_sender,
            refresh_interval,
            auth: None,
            require_login: false,
        }
    }

    pub fn with_auth(mut self, auth: Option<Arc<AuthService>>, require_login: bool) -> Self {
        self.auth = auth;
        self.require_login = require_login;
        self
    }
}

pub fn router(state: ApiState) -> Router {
    let login_enabled = state.auth.is_some();
    let state = Arc::new(state);

    // Behind the session gate when `require_login` is set.
    let gated = Router::new()
        .route("/api/proxies/:type", get(proxies::get_proxies))
        .route("/api/refresh", post(proxies::trigger_refresh))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            gate::require_session,
        ));

    let mut app = Router::new()
        .merge(gated)
        .route("/api/status", get(proxies::get_status))
        .route("/api/me", get(auth::me));

    if login_enabled {
        app = app
            .route("/auth/github", get(auth::login))
            .route("/success", get(auth::callback))
            .route("/logout", get(auth::logout));
    }

    app.fallback(assets::static_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_api_server(state: ApiState, addr: SocketAddr) -> Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind API server to {}", addr))?;
    info!("API Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server failed")?;

    info!("API Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    info!("Shutdown signal received.");
}

fn cookie_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::COOKIE).and_then(|v| v.to_str().ok())
}
