use super::kind::ProxyKind;
use super::registry::SourceRegistry;
use super::traits::{ListFetcher, ListManager};
use crate::store::CacheStore;
use futures::{stream, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, info};
use url::Url;

/// Outcome of one refresh cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    pub started_at: u64,
    pub finished_at: u64,
    pub updated: Vec<ProxyKind>,
    pub failed: Vec<RefreshFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshFailure {
    pub kind: ProxyKind,
    pub cause: String,
}

impl RefreshReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_kinds(&self) -> Vec<ProxyKind> {
        self.failed.iter().map(|f| f.kind).collect()
    }
}

enum Outcome {
    Updated(ProxyKind),
    Failed(RefreshFailure),
}

/// Fetches every registered source and stores each successful result.
///
/// Kinds are independent: a failure is logged and leaves that kind's cached
/// list untouched, and never stops the others. At most `concurrency` fetches
/// run at once.
pub async fn refresh_all(
    registry: &SourceRegistry,
    fetcher: &dyn ListFetcher,
    store: &dyn CacheStore,
    concurrency: usize,
) -> RefreshReport {
    let started_at = unix_now();

    // Collect first; a lazy map borrowing the registry is not Send under async_trait.
    let tasks: Vec<_> = registry
        .entries()
        .map(|(kind, url)| refresh_kind(kind, url, fetcher, store))
        .collect();

    let outcomes: Vec<Outcome> = stream::iter(tasks)
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut report = RefreshReport {
        started_at,
        ..Default::default()
    };
    for outcome in outcomes {
        match outcome {
            Outcome::Updated(kind) => report.updated.push(kind),
            Outcome::Failed(failure) => report.failed.push(failure),
        }
    }
    // buffer_unordered completes in arbitrary order
    report.updated.sort();
    report.failed.sort_by_key(|f| f.kind);
    report.finished_at = unix_now();
    report
}

async fn refresh_kind(
    kind: ProxyKind,
    url: &Url,
    fetcher: &dyn ListFetcher,
    store: &dyn CacheStore,
) -> Outcome {
    info!("Fetching {} proxy list from {}", kind, url);

    let body = match fetcher.fetch(url).await {
        Ok(body) => body,
        Err(e) => {
            error!("Error updating {} proxy list: {}", kind, e);
            return Outcome::Failed(RefreshFailure {
                kind,
                cause: e.to_string(),
            });
        }
    };

    let len = body.len();
    match store.write(kind, body).await {
        Ok(()) => {
            info!("Updated {} proxy list ({} bytes)", kind, len);
            Outcome::Updated(kind)
        }
        Err(e) => {
            error!("Error storing {} proxy list: {}", kind, e);
            Outcome::Failed(RefreshFailure {
                kind,
                cause: e.to_string(),
            })
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

pub struct StandardManager {
    registry: Arc<SourceRegistry>,
    fetcher: Arc<dyn ListFetcher>,
    store: Arc<dyn CacheStore>,
    concurrent_downloads: usize,
}

impl StandardManager {
    pub fn new(
        registry: Arc<SourceRegistry>,
        fetcher: Arc<dyn ListFetcher>,
        store: Arc<dyn CacheStore>,
        concurrent_downloads: usize,
    ) -> Self {
        Self {
            registry,
            fetcher,
            store,
            concurrent_downloads,
        }
    }
}

#[async_trait::async_trait]
impl ListManager for StandardManager {
    async fn refresh(&self) -> RefreshReport {
        info!("Refreshing {} proxy lists...", self.registry.len());

        let report = refresh_all(
            &self.registry,
            self.fetcher.as_ref(),
            self.store.as_ref(),
            self.concurrent_downloads,
        )
        .await;

        info!(
            "Proxy list refresh complete. Updated: {:?}, failed: {:?}",
            report.updated,
            report.failed_kinds()
        );
        report
    }
}
