use super::kind::ProxyKind;
use super::registry::SourceRegistry;
use crate::store::{CacheStore, CachedList};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Invalid proxy type")]
    InvalidKind(String),

    #[error("no {0} proxy list has been fetched yet")]
    NotYetAvailable(ProxyKind),
}

/// Read path for client requests.
#[derive(Clone)]
pub struct QueryService {
    registry: Arc<SourceRegistry>,
    store: Arc<dyn CacheStore>,
}

impl QueryService {
    pub fn new(registry: Arc<SourceRegistry>, store: Arc<dyn CacheStore>) -> Self {
        Self { registry, store }
    }

    /// Current list for the kind named `name`, body untouched.
    pub fn get_list(&self, name: &str) -> Result<Arc<CachedList>, QueryError> {
        let kind = self
            .registry
            .resolve(name)
            .ok_or_else(|| QueryError::InvalidKind(name.to_string()))?;
        self.store
            .read(kind)
            .ok_or(QueryError::NotYetAvailable(kind))
    }
}
