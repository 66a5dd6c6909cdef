use super::fetcher::FetchError;
use super::manager::RefreshReport;
use bytes::Bytes;
use url::Url;

/// Retrieves one source document. Exactly one attempt per call.
#[async_trait::async_trait]
pub trait ListFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Bytes, FetchError>;
}

/// The "Control Plane" for updates.
#[async_trait::async_trait]
pub trait ListManager: Send + Sync {
    /// Runs one refresh cycle over every registered kind.
    async fn refresh(&self) -> RefreshReport;
}
