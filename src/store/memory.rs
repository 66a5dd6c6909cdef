//! In-memory cache store.
//!
//! Each kind has a fixed slot holding an atomically swappable pointer, so
//! readers never take a lock and a write is published in a single store.

use super::types::{CacheStore, CachedList, StoreError};
use crate::engine::ProxyKind;
use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: [ArcSwapOption<CachedList>; ProxyKind::COUNT],
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn replace(&self, list: CachedList) {
        self.slots[list.kind.index()].store(Some(Arc::new(list)));
    }

    pub(crate) fn get(&self, kind: ProxyKind) -> Option<Arc<CachedList>> {
        self.slots[kind.index()].load_full()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn write(&self, kind: ProxyKind, content: Bytes) -> Result<(), StoreError> {
        self.replace(CachedList::new(kind, content));
        Ok(())
    }

    fn read(&self, kind: ProxyKind) -> Option<Arc<CachedList>> {
        self.get(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_absent_until_written() {
        let store = MemoryStore::new();
        assert!(store.read(ProxyKind::Http).is_none());

        store
            .write(ProxyKind::Http, Bytes::from_static(b""))
            .await
            .unwrap();

        // Empty but present is not the same as absent.
        let list = store.read(ProxyKind::Http).unwrap();
        assert!(list.content.is_empty());
        assert!(store.read(ProxyKind::Socks4).is_none());
    }

    #[tokio::test]
    async fn test_write_replaces_wholesale() {
        let store = MemoryStore::new();
        store
            .write(ProxyKind::Socks5, Bytes::from_static(b"1.1.1.1:1080\n"))
            .await
            .unwrap();
        store
            .write(ProxyKind::Socks5, Bytes::from_static(b"2.2.2.2:1080\n"))
            .await
            .unwrap();

        let list = store.read(ProxyKind::Socks5).unwrap();
        assert_eq!(list.kind, ProxyKind::Socks5);
        assert_eq!(&list.content[..], b"2.2.2.2:1080\n");
    }

    #[tokio::test]
    async fn test_snapshot_covers_every_kind() {
        let store = MemoryStore::new();
        store
            .write(ProxyKind::Socks4, Bytes::from_static(b"4.4.4.4:4145"))
            .await
            .unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), ProxyKind::COUNT);
        assert!(!snapshot[0].cached);
        assert_eq!(snapshot[0].bytes, None);
        assert_eq!(snapshot[1].kind, ProxyKind::Socks4);
        assert_eq!(snapshot[1].bytes, Some(12));
        assert!(snapshot[1].updated_at.is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reads_never_see_mixed_content() {
        let store = Arc::new(MemoryStore::new());
        let old = Bytes::from(vec![b'a'; 64 * 1024]);
        let new = Bytes::from(vec![b'b'; 64 * 1024]);
        store.write(ProxyKind::Http, old.clone()).await.unwrap();

        let mut readers = Vec::new();
        for _ in 0..4 {
            let store = store.clone();
            let (old, new) = (old.clone(), new.clone());
            readers.push(tokio::spawn(async move {
                for _ in 0..2_000 {
                    let list = store.read(ProxyKind::Http).unwrap();
                    assert!(list.content == old || list.content == new);
                    tokio::task::yield_now().await;
                }
            }));
        }

        for i in 0..200 {
            let body = if i % 2 == 0 { new.clone() } else { old.clone() };
            store.write(ProxyKind::Http, body).await.unwrap();
            tokio::task::yield_now().await;
        }

        for reader in readers {
            reader.await.unwrap();
        }
    }
}
