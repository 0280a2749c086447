//! # Document Store
//!
//! A small document-database abstraction: named collections of JSON
//! documents keyed by string ids, queried with field filters, a single
//! ordering field and keyset cursors.
//!
//! Two back ends implement [`DocumentStore`]:
//! - [`MemoryDocumentStore`]: process-local, used by tests and local development
//! - [`PgDocumentStore`]: a single PostgreSQL `documents` table with a JSONB body
//!
//! ## Usage
//!
//! ```rust,no_run
//! use doc_store::{fetch_page, Direction, DocumentStore, MemoryDocumentStore, Query};
//! use serde_json::json;
//!
//! # async fn run() -> doc_store::DocStoreResult<()> {
//! let store = MemoryDocumentStore::new();
//! store.create("companies", "c1", json!({"name": "Ora", "total_rating": 4.5})).await?;
//!
//! let query = Query::new("companies").order_by("total_rating", Direction::Desc);
//! let page = fetch_page(&store, query, 20).await?;
//! assert_eq!(page.items.len(), 1);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

mod cursor;
mod error;
mod memory;
mod postgres;
mod query;

pub use cursor::Cursor;
pub use error::{DocStoreError, DocStoreResult};
pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;
pub use query::{compare_values, Direction, Filter, FilterOp, OrderBy, Query};

/// A stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

/// One page of query results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Opaque cursor for the following page; `None` on the last page
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
        }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
        }
    }
}

/// Storage operations every back end provides.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document body by id.
    async fn get(&self, collection: &str, id: &str) -> DocStoreResult<Option<Value>>;

    /// Insert a new document.
    ///
    /// # Errors
    ///
    /// Returns [`DocStoreError::AlreadyExists`] when the id is taken.
    async fn create(&self, collection: &str, id: &str, data: Value) -> DocStoreResult<()>;

    /// Insert or replace a document.
    async fn set(&self, collection: &str, id: &str, data: Value) -> DocStoreResult<()>;

    /// Shallow-merge `patch` into the top level of an existing document.
    ///
    /// # Errors
    ///
    /// Returns [`DocStoreError::NotFound`] when the document does not exist.
    async fn update(&self, collection: &str, id: &str, patch: Map<String, Value>)
        -> DocStoreResult<()>;

    /// Remove a document. Returns whether anything was deleted.
    async fn delete(&self, collection: &str, id: &str) -> DocStoreResult<bool>;

    /// Run a query and return matching documents in query order.
    async fn query(&self, query: &Query) -> DocStoreResult<Vec<Document>>;

    /// Count the documents of a collection matching every filter.
    async fn count(&self, collection: &str, filters: &[Filter]) -> DocStoreResult<u64>;
}

/// Run `query` for one page of `limit` documents.
///
/// One extra row is fetched to learn whether a following page exists; the
/// returned cursor points at the last document of this page.
pub async fn fetch_page<S>(store: &S, query: Query, limit: usize) -> DocStoreResult<Page<Document>>
where
    S: DocumentStore + ?Sized,
{
    let limit = limit.max(1);
    let lookahead = Query {
        limit: Some(limit + 1),
        ..query.clone()
    };

    let mut items = store.query(&lookahead).await?;
    let next_cursor = if items.len() > limit {
        items.truncate(limit);
        items.last().map(|doc| query.cursor_for(doc).encode())
    } else {
        None
    };

    Ok(Page { items, next_cursor })
}

/// Turn a document body into a top-level field map.
pub(crate) fn into_object(collection: &str, id: &str, data: Value) -> DocStoreResult<Map<String, Value>> {
    match data {
        Value::Object(map) => Ok(map),
        other => Err(DocStoreError::Serialization(serde::de::Error::custom(format!(
            "document {}/{} must be a JSON object, got {}",
            collection,
            id,
            json_type_name(&other)
        )))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
