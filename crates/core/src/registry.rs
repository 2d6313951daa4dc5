//! Source → page URL registry.
//!
//! Loaded once at startup from a JSON object such as
//! `{"carrefour": ["https://..."], "dia": ["https://..."]}` and shared
//! read-only for the rest of the process.

use std::collections::BTreeMap;
use std::path::Path;

use crate::Error;

/// Immutable mapping from lowercase source name to its ordered page URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlRegistry {
    sources: BTreeMap<String, Vec<String>>,
}

impl UrlRegistry {
    /// Build a registry from in-memory entries. Source names are lowercased;
    /// lists under names that collide after lowercasing are appended in order.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<String>)>,
        S: AsRef<str>,
    {
        let mut sources: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, urls) in entries {
            sources
                .entry(name.as_ref().trim().to_lowercase())
                .or_default()
                .extend(urls);
        }
        Self { sources }
    }

    /// Parse a registry from its JSON text.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let raw: BTreeMap<String, Vec<String>> =
            serde_json::from_str(json).map_err(|e| Error::RegistryInvalid(e.to_string()))?;
        Ok(Self::from_entries(raw))
    }

    /// Read and parse the registry file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::RegistryUnreadable { path: path.display().to_string(), reason: e.to_string() })?;

        let registry = Self::from_json(&json)?;
        tracing::info!(
            path = %path.display(),
            sources = registry.sources.len(),
            urls = registry.url_count(),
            "loaded URL registry"
        );
        Ok(registry)
    }

    /// URLs registered for `source`, or an empty slice when unknown.
    pub fn urls(&self, source: &str) -> &[String] {
        self.sources
            .get(source)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Registered source names in lexical order.
    pub fn source_names(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    pub fn url_count(&self) -> usize {
        self.sources.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
