//! Process-local document store.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{DocStoreError, DocStoreResult};
use crate::query::{validate_field, Filter, Query};
use crate::{into_object, Document, DocumentStore};

type Collections = HashMap<String, BTreeMap<String, Map<String, Value>>>;

/// In-memory [`DocumentStore`]. Cloning shares the underlying data.
#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    collections: Arc<RwLock<Collections>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> DocStoreResult<Option<Value>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|map| Value::Object(map.clone())))
    }

    async fn create(&self, collection: &str, id: &str, data: Value) -> DocStoreResult<()> {
        let map = into_object(collection, id, data)?;
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();

        if docs.contains_key(id) {
            return Err(DocStoreError::already_exists(collection, id));
        }
        docs.insert(id.to_string(), map);
        Ok(())
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> DocStoreResult<()> {
        let map = into_object(collection, id, data)?;
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), map);
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Map<String, Value>,
    ) -> DocStoreResult<()> {
        let mut collections = self.collections.write().await;
        let existing = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| DocStoreError::not_found(collection, id))?;

        for (key, value) in patch {
            existing.insert(key, value);
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> DocStoreResult<bool> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(collection)
            .map(|docs| docs.remove(id).is_some())
            .unwrap_or(false))
    }

    async fn query(&self, query: &Query) -> DocStoreResult<Vec<Document>> {
        query.validate()?;

        let collections = self.collections.read().await;
        let Some(docs) = collections.get(&query.collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<Document> = docs
            .iter()
            .map(|(id, map)| Document {
                id: id.clone(),
                data: Value::Object(map.clone()),
            })
            .filter(|doc| query.matches(&doc.data))
            .collect();
        drop(collections);

        matched.sort_by(|a, b| query.compare_documents(a, b));

        if let Some(cursor) = &query.start_after {
            matched.retain(|doc| query.is_after(doc, cursor));
        }
        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }

        Ok(matched)
    }

    async fn count(&self, collection: &str, filters: &[Filter]) -> DocStoreResult<u64> {
        for filter in filters {
            validate_field(&filter.field)?;
        }

        let collections = self.collections.read().await;
        let count = collections
            .get(collection)
            .map(|docs| {
                docs.values()
                    .filter(|map| {
                        let data = Value::Object((*map).clone());
                        filters.iter().all(|f| f.matches(&data))
                    })
                    .count()
            })
            .unwrap_or(0);

        Ok(count as u64)
    }
}
