//! Upstream page store: the page model, the store interface, and its
//! implementations (Notion REST client, in-memory fixtures).

pub mod client;
pub mod fixtures;
pub mod page;

pub use client::NotionClient;
pub use fixtures::InMemoryPageStore;
pub use page::{DateValue, Page, PropertyBag, PropertyValue, RelationId, RichText, SelectOption};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Read-only access to the upstream page workspace.
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Fetch a single page. `Ok(None)` when the id does not resolve.
    async fn get_page(&self, id: &str) -> Result<Option<Page>>;

    /// Fetch many pages in one batch, in request order.
    ///
    /// Ids that cannot be resolved are dropped silently; a batch that is only
    /// partially satisfiable is not an error.
    async fn get_pages_by_ids(&self, ids: &[String]) -> Result<Vec<Page>>;

    /// List pages of a database, optionally narrowed by an upstream filter object.
    async fn query_database(&self, database_id: &str, filter: Option<Value>) -> Result<Vec<Page>>;
}
