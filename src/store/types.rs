use crate::engine::ProxyKind;
use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// The latest successfully fetched document for one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedList {
    pub kind: ProxyKind,
    /// Raw body exactly as the source returned it.
    pub content: Bytes,
    pub updated_at: SystemTime,
}

impl CachedList {
    pub fn new(kind: ProxyKind, content: Bytes) -> Self {
        Self {
            kind,
            content,
            updated_at: SystemTime::now(),
        }
    }

    pub fn updated_at_unix(&self) -> u64 {
        self.updated_at
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Per-kind summary used for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotSummary {
    pub kind: ProxyKind,
    pub cached: bool,
    pub bytes: Option<usize>,
    pub updated_at: Option<u64>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to persist {kind} list to {}: {source}", path.display())]
    Persist {
        kind: ProxyKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to prepare cache directory {}: {source}", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Latest-value store with one slot per proxy kind.
///
/// `write` replaces a slot wholesale; a concurrent `read` sees either the old
/// list or the new one, never a mix.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn write(&self, kind: ProxyKind, content: Bytes) -> Result<(), StoreError>;

    /// `None` until the first successful write for `kind`.
    fn read(&self, kind: ProxyKind) -> Option<Arc<CachedList>>;

    fn snapshot(&self) -> Vec<SlotSummary> {
        ProxyKind::ALL
            .into_iter()
            .map(|kind| {
                let list = self.read(kind);
                SlotSummary {
                    kind,
                    cached: list.is_some(),
                    bytes: list.as_ref().map(|l| l.content.len()),
                    updated_at: list.as_ref().map(|l| l.updated_at_unix()),
                }
            })
            .collect()
    }
}
