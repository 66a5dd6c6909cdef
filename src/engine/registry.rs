//! Static mapping from proxy kind to the remote document holding its list.

use super::kind::{ProxyKind, UnknownKind};
use std::collections::BTreeMap;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("source configured for {0}")]
    UnknownKind(#[from] UnknownKind),

    #[error("invalid source URL for {kind}: {url}: {source}")]
    InvalidUrl {
        kind: ProxyKind,
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("source URL for {kind} must use http or https: {url}")]
    UnsupportedScheme { kind: ProxyKind, url: String },
}

/// Built once at startup and shared read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    entries: BTreeMap<ProxyKind, Url>,
}

impl SourceRegistry {
    pub fn new(entries: impl IntoIterator<Item = (ProxyKind, Url)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Builds the registry from the `[sources]` config table (kind name -> URL).
    pub fn from_config(sources: &BTreeMap<String, String>) -> Result<Self, RegistryError> {
        let mut entries = BTreeMap::new();
        for (name, raw_url) in sources {
            let kind: ProxyKind = name.parse()?;
            let url = Url::parse(raw_url).map_err(|source| RegistryError::InvalidUrl {
                kind,
                url: raw_url.clone(),
                source,
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(RegistryError::UnsupportedScheme {
                    kind,
                    url: raw_url.clone(),
                });
            }
            entries.insert(kind, url);
        }
        Ok(Self { entries })
    }

    /// Registered kinds in declaration order (http, socks4, socks5).
    pub fn list_kinds(&self) -> Vec<ProxyKind> {
        self.entries.keys().copied().collect()
    }

    pub fn url_for(&self, kind: ProxyKind) -> Option<&Url> {
        self.entries.get(&kind)
    }

    pub fn contains(&self, kind: ProxyKind) -> bool {
        self.entries.contains_key(&kind)
    }

    /// Maps a client-supplied name to a registered kind.
    pub fn resolve(&self, name: &str) -> Option<ProxyKind> {
        name.parse().ok().filter(|kind| self.contains(*kind))
    }

    pub fn entries(&self) -> impl Iterator<Item = (ProxyKind, &Url)> {
        self.entries.iter().map(|(kind, url)| (*kind, url))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
