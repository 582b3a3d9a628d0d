//! Advisory page cache and a read-through [`PageStore`] wrapper over it.

pub mod page_cache;

pub use page_cache::PageCache;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::notion::{Page, PageStore};

/// Read-through cache in front of any page store.
///
/// Single and batch lookups are served from the cache where possible; only
/// misses reach the inner store. Database listings always go upstream but warm
/// the cache with what they return.
pub struct CachedPageStore<S> {
    inner: S,
    cache: Arc<PageCache>,
}

impl<S: PageStore> CachedPageStore<S> {
    pub fn new(inner: S, cache: Arc<PageCache>) -> Self {
        Self { inner, cache }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn cache(&self) -> &Arc<PageCache> {
        &self.cache
    }
}

#[async_trait]
impl<S: PageStore> PageStore for CachedPageStore<S> {
    async fn get_page(&self, id: &str) -> Result<Option<Page>> {
        if let Some(page) = self.cache.get(id) {
            log::debug!("Page cache hit: {}", id);
            return Ok(Some(page));
        }
        let page = self.inner.get_page(id).await?;
        if let Some(page) = &page {
            self.cache.insert_if_absent(page.clone());
        }
        Ok(page)
    }

    async fn get_pages_by_ids(&self, ids: &[String]) -> Result<Vec<Page>> {
        let mut found: HashMap<String, Page> = HashMap::with_capacity(ids.len());
        let mut misses: Vec<String> = Vec::new();
        for id in ids {
            if found.contains_key(id) || misses.contains(id) {
                continue;
            }
            match self.cache.get(id) {
                Some(page) => {
                    found.insert(id.clone(), page);
                }
                None => misses.push(id.clone()),
            }
        }

        log::debug!(
            "Page cache batch: {} hits, {} misses",
            found.len(),
            misses.len()
        );

        if !misses.is_empty() {
            for page in self.inner.get_pages_by_ids(&misses).await? {
                self.cache.insert_if_absent(page.clone());
                found.insert(page.id.clone(), page);
            }
        }

        Ok(ids.iter().filter_map(|id| found.get(id).cloned()).collect())
    }

    async fn query_database(&self, database_id: &str, filter: Option<Value>) -> Result<Vec<Page>> {
        let pages = self.inner.query_database(database_id, filter).await?;
        for page in &pages {
            self.cache.insert_if_absent(page.clone());
        }
        Ok(pages)
    }
}
