//! In-memory page store backed by fixture data.
//!
//! Serves pages from a JSON document keyed by database id. Used for offline
//! development (`storygraph serve-fixtures`) and throughout the test suite,
//! where it records every batch request and can be armed to fail or stall.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Result, StorygraphError};
use crate::notion::{Page, PageStore};

#[derive(Debug, Clone)]
enum BatchFault {
    Reject(String),
    Stall(Duration),
}

/// Fixture-backed [`PageStore`].
#[derive(Default)]
pub struct InMemoryPageStore {
    pages: HashMap<String, Page>,
    databases: HashMap<String, Vec<String>>,
    batch_calls: AtomicUsize,
    batches: Mutex<Vec<Vec<String>>>,
    fault: Mutex<Option<BatchFault>>,
}

impl InMemoryPageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a fixture document: `{ "<database id>": [page, ...], ... }`.
    pub fn from_fixture_value(value: Value) -> Result<Self> {
        let databases: HashMap<String, Vec<Page>> = serde_json::from_value(value)?;
        let mut store = Self::new();
        for (database_id, pages) in databases {
            store.insert_database(&database_id, pages);
        }
        Ok(store)
    }

    /// Load a fixture document from disk.
    pub fn from_fixture_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&raw)?;
        let store = Self::from_fixture_value(value)?;
        log::info!(
            "Loaded {} fixture pages from {}",
            store.pages.len(),
            path.display()
        );
        Ok(store)
    }

    /// Add a page that belongs to no database listing.
    pub fn insert(&mut self, page: Page) {
        self.pages.insert(page.id.clone(), page);
    }

    /// Add pages and list them under `database_id`.
    pub fn insert_database(&mut self, database_id: &str, pages: Vec<Page>) {
        let listing = self.databases.entry(database_id.to_string()).or_default();
        for page in pages {
            listing.push(page.id.clone());
            self.pages.insert(page.id.clone(), page);
        }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Number of `get_pages_by_ids` calls served so far.
    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    /// Ids requested by each batch call, in call order.
    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Make every subsequent batch call fail with `message`.
    pub fn fail_batches_with(&self, message: &str) {
        *self.fault.lock().unwrap_or_else(|e| e.into_inner()) =
            Some(BatchFault::Reject(message.to_string()));
    }

    /// Make every subsequent batch call sleep for `delay` before answering.
    pub fn stall_batches_for(&self, delay: Duration) {
        *self.fault.lock().unwrap_or_else(|e| e.into_inner()) = Some(BatchFault::Stall(delay));
    }

    pub fn clear_faults(&self) {
        *self.fault.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

#[async_trait]
impl PageStore for InMemoryPageStore {
    async fn get_page(&self, id: &str) -> Result<Option<Page>> {
        Ok(self.pages.get(id).cloned())
    }

    async fn get_pages_by_ids(&self, ids: &[String]) -> Result<Vec<Page>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        self.batches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(ids.to_vec());

        let fault = self.fault.lock().unwrap_or_else(|e| e.into_inner()).clone();
        match fault {
            Some(BatchFault::Reject(message)) => return Err(StorygraphError::Upstream(message)),
            Some(BatchFault::Stall(delay)) => tokio::time::sleep(delay).await,
            None => {}
        }

        Ok(ids.iter().filter_map(|id| self.pages.get(id).cloned()).collect())
    }

    async fn query_database(&self, database_id: &str, filter: Option<Value>) -> Result<Vec<Page>> {
        if filter.is_some() {
            log::debug!("Fixture store ignores query filters (database {})", database_id);
        }
        let ids = self.databases.get(database_id).ok_or_else(|| {
            StorygraphError::Upstream(format!("Database {} not found", database_id))
        })?;
        Ok(ids.iter().filter_map(|id| self.pages.get(id).cloned()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> InMemoryPageStore {
        InMemoryPageStore::from_fixture_value(json!({
            "characters": [
                { "id": "c1", "properties": { "Name": { "type": "title", "title": [{ "plain_text": "Ada" }] } } },
                { "id": "c2" }
            ]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_batch_drops_unknown_ids() {
        let store = store();
        let pages = store
            .get_pages_by_ids(&["c2".into(), "missing".into(), "c1".into()])
            .await
            .unwrap();
        let ids: Vec<_> = pages.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["c2", "c1"]);
        assert_eq!(store.batch_calls(), 1);
    }

    #[tokio::test]
    async fn test_query_database_lists_in_order() {
        let store = store();
        let pages = store.query_database("characters", None).await.unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].title(), "Ada");
        assert!(store.query_database("nope", None).await.is_err());
    }

    #[tokio::test]
    async fn test_armed_failure() {
        let store = store();
        store.fail_batches_with("upstream exploded");
        let err = store.get_pages_by_ids(&["c1".into()]).await.unwrap_err();
        assert!(err.to_string().contains("upstream exploded"));
        store.clear_faults();
        assert_eq!(store.get_pages_by_ids(&["c1".into()]).await.unwrap().len(), 1);
        assert_eq!(store.batches().len(), 2);
    }

    #[test]
    fn test_demo_fixture_file_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/fixtures.json");
        let store = InMemoryPageStore::from_fixture_file(&path).unwrap();
        assert_eq!(store.len(), 7);
        assert!(!store.is_empty());
    }

    #[tokio::test]
    async fn test_get_page_unaffected_by_faults() {
        let store = store();
        store.fail_batches_with("down");
        assert!(store.get_page("c1").await.unwrap().is_some());
        assert!(store.get_page("zzz").await.unwrap().is_none());
    }
}
