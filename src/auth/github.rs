use super::AuthError;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

const AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const USER_URL: &str = "https://api.github.com/user";
const SCOPE: &str = "user:email";

/// GitHub OAuth endpoints; overridable so tests can point at a local server.
#[derive(Debug, Clone)]
pub struct GithubEndpoints {
    pub authorize: String,
    pub token: String,
    pub user: String,
}

impl Default for GithubEndpoints {
    fn default() -> Self {
        Self {
            authorize: AUTHORIZE_URL.to_string(),
            token: TOKEN_URL.to_string(),
            user: USER_URL.to_string(),
        }
    }
}

// GitHub answers token errors with 200 and an `error` field.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubProfile {
    pub id: u64,
    pub login: String,
}

#[derive(Debug, Clone)]
pub struct GithubClient {
    client: Client,
    client_id: String,
    client_secret: String,
    callback_url: String,
    endpoints: GithubEndpoints,
}

impl GithubClient {
    pub fn new(
        client: Client,
        client_id: String,
        client_secret: String,
        callback_url: String,
        endpoints: GithubEndpoints,
    ) -> Self {
        Self {
            client,
            client_id,
            client_secret,
            callback_url,
            endpoints,
        }
    }

    /// Authorization URL to send the browser to.
    pub fn authorize_url(&self, state: &str) -> Result<Url, AuthError> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.callback_url.as_str()),
            ("scope", SCOPE),
            ("state", state),
        ];
        Url::parse_with_params(&self.endpoints.authorize, &params)
            .map_err(|e| AuthError::Config(format!("bad authorize endpoint: {}", e)))
    }

    pub async fn exchange_code(&self, code: &str) -> Result<String, AuthError> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", self.callback_url.as_str()),
        ];

        let response = self
            .client
            .post(&self.endpoints.token)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&params)
            .send()
            .await?
            .error_for_status()?;

        let token: TokenResponse = response.json().await?;
        match (token.access_token, token.error) {
            (Some(access_token), None) => Ok(access_token),
            (_, error) => Err(AuthError::TokenExchange(
                token
                    .error_description
                    .or(error)
                    .unwrap_or_else(|| "no access token in response".to_string()),
            )),
        }
    }

    pub async fn fetch_profile(&self, access_token: &str) -> Result<GithubProfile, AuthError> {
        let profile = self
            .client
            .get(&self.endpoints.user)
            .bearer_auth(access_token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await?
            .error_for_status()?
            .json::<GithubProfile>()
            .await?;
        Ok(profile)
    }
}
