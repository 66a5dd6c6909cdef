//! GitHub login: OAuth round trip, local user upsert and cookie sessions.

pub mod github;
pub mod session;

pub use self::github::{GithubClient, GithubEndpoints, GithubProfile};
pub use self::session::{SessionStore, SESSION_COOKIE};

use crate::db::{User, UserDb};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};
use url::Url;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid or expired OAuth state")]
    InvalidState,

    #[error("GitHub token exchange failed: {0}")]
    TokenExchange(String),

    #[error("GitHub request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("User store error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Auth configuration error: {0}")]
    Config(String),
}

pub struct AuthService {
    github: GithubClient,
    users: Arc<UserDb>,
    sessions: SessionStore,
}

impl AuthService {
    pub fn new(github: GithubClient, users: Arc<UserDb>, sessions: SessionStore) -> Self {
        Self {
            github,
            users,
            sessions,
        }
    }

    /// Where to send the browser to start a login.
    pub fn begin_login(&self) -> Result<Url, AuthError> {
        let state = self.sessions.issue_state();
        self.github.authorize_url(&state)
    }

    /// Finishes the OAuth callback. Returns the user and a session cookie value.
    pub async fn complete_login(&self, code: &str, state: &str) -> Result<(User, String), AuthError> {
        if !self.sessions.take_state(state) {
            return Err(AuthError::InvalidState);
        }

        let token = self.github.exchange_code(code).await?;
        let profile = self.github.fetch_profile(&token).await?;
        let user = self
            .users
            .upsert_user(&profile.id.to_string(), &profile.login)?;

        info!("User '{}' (github id {}) logged in", user.username, user.github_id);
        let cookie = self.sessions.create(user.id);
        Ok((user, cookie))
    }

    /// The user behind a `Cookie:` header, if any.
    pub fn current_user(&self, cookie_header: Option<&str>) -> Option<User> {
        let value = session::cookie_value(cookie_header?, SESSION_COOKIE)?;
        let user_id = self.sessions.resolve(value)?;
        match self.users.get_user(user_id) {
            Ok(user) => user,
            Err(e) => {
                error!("Failed to load user {}: {}", user_id, e);
                None
            }
        }
    }

    pub fn logout(&self, cookie_header: Option<&str>) {
        if let Some(value) = cookie_header.and_then(|h| session::cookie_value(h, SESSION_COOKIE)) {
            self.sessions.remove(value);
        }
    }
}
