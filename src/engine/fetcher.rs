use super::traits::ListFetcher;
use bytes::Bytes;
use reqwest::{header, Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;
use url::Url;

const USER_AGENT: &str = concat!("ProxyShelf/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: StatusCode },

    #[error("reading body from {url} failed: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Used by fetchers that are not backed by HTTP.
    #[error("{0}")]
    Other(String),
}

/// Fetches source documents over HTTP(S) with transport defaults.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// `timeout` overrides the client default only when set.
    pub fn new(timeout: Option<Duration>) -> reqwest::Result<Self> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait::async_trait]
impl ListFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Bytes, FetchError> {
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let body = resp.bytes().await.map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })?;

        // Stored as-is either way; these only flag a suspicious source.
        if body.is_empty() {
            warn!("{} returned an empty document", url);
        }
        if let Some(ct) = content_type.filter(|ct| !is_textual(ct)) {
            warn!("{} returned non-text content type '{}'", url, ct);
        }

        Ok(body)
    }
}

fn is_textual(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime.starts_with("text/") || mime == "application/octet-stream"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_textual() {
        assert!(is_textual("text/plain; charset=utf-8"));
        assert!(is_textual("TEXT/PLAIN"));
        // raw.githubusercontent.com style downloads
        assert!(is_textual("application/octet-stream"));
        assert!(!is_textual("image/png"));
        assert!(!is_textual("application/json"));
    }
}
