// Copyright 2025 Fondazione LINKS

// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at

//     http://www.apache.org/licenses/LICENSE-2.0

// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
};

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::{
    cid::CidDocument,
    errors::{Error, Result},
};

/// Resolves a URL to a JSON document.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    async fn load(&self, url: &str) -> Result<Value>;
}

/// Content cache keyed by normalized URL.
pub trait ContextCache: Send + Sync {
    fn get(&self, url: &str) -> Option<Value>;
    fn put(&self, url: &str, value: Value);
}

/// Drops the fragment, lowercases scheme and host and removes default ports.
///
/// Ids that are not hierarchical URLs, such as `did:` ids, only lose their fragment.
pub fn normalize_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) if !url.cannot_be_a_base() => {
            url.set_fragment(None);
            url.into()
        }
        _ => raw.split_once('#').map_or(raw, |(base, _)| base).to_owned(),
    }
}

/// Serves documents registered up front.
#[derive(Debug, Clone, Default)]
pub struct StaticDocumentLoader {
    documents: HashMap<String, Value>,
}

impl StaticDocumentLoader {
    pub fn insert(&mut self, url: &str, document: Value) {
        self.documents.insert(normalize_url(url), document);
    }

    /// Registers a CID document under its own id.
    pub fn with_cid(mut self, cid: &CidDocument) -> Result<Self> {
        self.insert(&cid.id, serde_json::to_value(cid)?);
        Ok(self)
    }
}

#[async_trait]
impl DocumentLoader for StaticDocumentLoader {
    async fn load(&self, url: &str) -> Result<Value> {
        self.documents.get(&normalize_url(url)).cloned().ok_or_else(|| Error::DocumentLoad {
            url: url.to_owned(),
            reason: "not registered".to_owned(),
        })
    }
}

#[derive(Debug, Default)]
pub struct InMemoryContextCache {
    entries: RwLock<HashMap<String, Value>>,
}

impl ContextCache for InMemoryContextCache {
    fn get(&self, url: &str) -> Option<Value> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(&normalize_url(url)).cloned()
    }

    fn put(&self, url: &str, value: Value) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(normalize_url(url), value);
    }
}

/// Consults `cache` before delegating to `inner`, storing every successful load.
#[derive(Debug, Default)]
pub struct CachingDocumentLoader<L, C> {
    inner: L,
    cache: C,
}

impl<L: DocumentLoader, C: ContextCache> CachingDocumentLoader<L, C> {
    pub fn new(inner: L, cache: C) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }
}

#[async_trait]
impl<L: DocumentLoader, C: ContextCache> DocumentLoader for CachingDocumentLoader<L, C> {
    async fn load(&self, url: &str) -> Result<Value> {
        if let Some(hit) = self.cache.get(url) {
            log::debug!("document cache hit for {url}");
            return Ok(hit);
        }
        let document = self.inner.load(url).await?;
        self.cache.put(url, document.clone());
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn normalization_drops_fragment_and_case() {
        assert_eq!(normalize_url("HTTP://Example.ORG/Alice#key-1"), "http://example.org/Alice");
        assert_eq!(normalize_url("did:example:ABC#k"), "did:example:ABC");
        assert_eq!(normalize_url("https://Host"), "https://host/");
        assert_eq!(normalize_url("https://example.org:443/ctx"), "https://example.org/ctx");
        assert_eq!(normalize_url("http://example.org:8080/ctx"), "http://example.org:8080/ctx");
    }

    #[test]
    fn normalization_keeps_query_case() {
        let upper = normalize_url("https://Example.org?Doc=A");
        assert_eq!(upper, "https://example.org/?Doc=A");
        assert_ne!(upper, normalize_url("https://example.org?doc=a"));
    }

    struct CountingLoader(AtomicUsize);

    #[async_trait]
    impl DocumentLoader for CountingLoader {
        async fn load(&self, url: &str) -> Result<Value> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(json!({ "id": url }))
        }
    }

    #[tokio::test]
    async fn caching_loader_fetches_once_per_normalized_url() {
        let loader = CachingDocumentLoader::new(CountingLoader(AtomicUsize::new(0)), InMemoryContextCache::default());
        loader.load("https://example.org/ctx").await.unwrap();
        loader.load("HTTPS://EXAMPLE.org/ctx#frag").await.unwrap();
        assert_eq!(loader.inner.0.load(Ordering::SeqCst), 1);
        assert!(loader.cache().get("https://example.org/ctx").is_some());
    }

    #[tokio::test]
    async fn static_loader_reports_missing_documents() {
        let mut loader = StaticDocumentLoader::default();
        loader.insert("http://example.org/alice", json!({"id": "http://example.org/alice"}));
        assert!(loader.load("http://example.org/alice#key-1").await.is_ok());
        assert!(matches!(loader.load("http://example.org/bob").await, Err(Error::DocumentLoad { .. })));
    }
}
