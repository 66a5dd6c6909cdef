//! File-backed cache store.
//!
//! Mirrors every slot to `<data_dir>/<kind>.txt` so lists survive restarts.
//! Reads are served from the in-memory mirror; files are only read at startup.

use super::memory::MemoryStore;
use super::types::{CacheStore, CachedList, StoreError};
use crate::engine::ProxyKind;
use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::fs;
use tracing::{info, warn};

#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    mirror: MemoryStore,
}

impl FileStore {
    /// Opens (creating if needed) the data directory and loads any lists a
    /// previous run left behind.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(|source| StoreError::Directory {
                path: dir.clone(),
                source,
            })?;

        let store = Self {
            dir,
            mirror: MemoryStore::new(),
        };

        for kind in ProxyKind::ALL {
            store.load_existing(kind).await;
        }

        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, kind: ProxyKind) -> PathBuf {
        self.dir.join(format!("{}.txt", kind))
    }

    async fn load_existing(&self, kind: ProxyKind) {
        let path = self.path_for(kind);
        let content = match fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return,
            Err(e) => {
                warn!("Ignoring unreadable cached list {}: {}", path.display(), e);
                return;
            }
        };

        let updated_at = match fs::metadata(&path).await.and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(_) => SystemTime::now(),
        };

        info!(
            "Loaded cached {} list from {} ({} bytes)",
            kind,
            path.display(),
            content.len()
        );
        self.mirror.replace(CachedList {
            kind,
            content: Bytes::from(content),
            updated_at,
        });
    }
}

#[async_trait]
impl CacheStore for FileStore {
    async fn write(&self, kind: ProxyKind, content: Bytes) -> Result<(), StoreError> {
        let path = self.path_for(kind);
        // Write-then-rename keeps the file itself old-or-new for outside readers.
        let tmp = self
            .dir
            .join(format!(".{}.{}.tmp", kind, uuid::Uuid::new_v4().simple()));

        let persist = async {
            fs::write(&tmp, &content).await?;
            fs::rename(&tmp, &path).await
        };
        if let Err(source) = persist.await {
            let _ = fs::remove_file(&tmp).await;
            return Err(StoreError::Persist { kind, path, source });
        }

        self.mirror.replace(CachedList::new(kind, content));
        Ok(())
    }

    fn read(&self, kind: ProxyKind) -> Option<Arc<CachedList>> {
        self.mirror.get(kind)
    }
}
