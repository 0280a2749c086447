//! Typed collections over the document store.
//!
//! Each entity lives in its own collection; a [`Collection`] converts between
//! entity structs and JSON documents. Stored documents that no longer match
//! the entity schema are skipped on reads that return many rows.

use doc_store::{fetch_page, DocStoreError, DocStoreResult, DocumentStore, Filter, Page, Query};
use serde_json::{Map, Value};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::warn;

use crate::domain::{Category, Company, Entity, Property, Report, Review, ReviewClaim, Vote};

pub struct Collection<T> {
    store: Arc<dyn DocumentStore>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> Collection<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        T::COLLECTION
    }

    /// Base query over this collection.
    pub fn query(&self) -> Query {
        Query::new(T::COLLECTION)
    }

    pub async fn get(&self, id: &str) -> DocStoreResult<Option<T>> {
        match self.store.get(T::COLLECTION, id).await? {
            Some(data) => Ok(Some(serde_json::from_value(data)?)),
            None => Ok(None),
        }
    }

    /// Like [`get`](Self::get) but a missing document is an error.
    pub async fn require(&self, id: &str) -> DocStoreResult<T> {
        self.get(id)
            .await?
            .ok_or_else(|| DocStoreError::not_found(T::COLLECTION, id))
    }

    /// Store a new entity; fails when its id is taken.
    pub async fn insert(&self, entity: &T) -> DocStoreResult<()> {
        let data = serde_json::to_value(entity)?;
        self.store.create(T::COLLECTION, entity.id(), data).await
    }

    /// Store an entity, replacing any previous version.
    pub async fn put(&self, entity: &T) -> DocStoreResult<()> {
        let data = serde_json::to_value(entity)?;
        self.store.set(T::COLLECTION, entity.id(), data).await
    }

    pub async fn patch(&self, id: &str, patch: Map<String, Value>) -> DocStoreResult<()> {
        self.store.update(T::COLLECTION, id, patch).await
    }

    pub async fn remove(&self, id: &str) -> DocStoreResult<bool> {
        self.store.delete(T::COLLECTION, id).await
    }

    pub async fn find(&self, query: &Query) -> DocStoreResult<Vec<T>> {
        let docs = self.store.query(query).await?;
        Ok(docs
            .into_iter()
            .filter_map(|doc| decode::<T>(doc.id, doc.data))
            .collect())
    }

    pub async fn find_page(&self, query: Query, limit: usize) -> DocStoreResult<Page<T>> {
        let page = fetch_page(self.store.as_ref(), query, limit).await?;
        Ok(Page {
            items: page
                .items
                .into_iter()
                .filter_map(|doc| decode::<T>(doc.id, doc.data))
                .collect(),
            next_cursor: page.next_cursor,
        })
    }

    pub async fn count(&self, filters: &[Filter]) -> DocStoreResult<u64> {
        self.store.count(T::COLLECTION, filters).await
    }
}

fn decode<T: Entity>(id: String, data: Value) -> Option<T> {
    match serde_json::from_value(data) {
        Ok(entity) => Some(entity),
        Err(e) => {
            warn!(collection = T::COLLECTION, id = %id, error = %e, "Skipping malformed document");
            None
        }
    }
}

/// One typed collection per entity, sharing a store.
#[derive(Clone)]
pub struct Repositories {
    pub categories: Collection<Category>,
    pub companies: Collection<Company>,
    pub properties: Collection<Property>,
    pub reviews: Collection<Review>,
    pub review_claims: Collection<ReviewClaim>,
    pub votes: Collection<Vote>,
    pub reports: Collection<Report>,
}

impl Repositories {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            categories: Collection::new(store.clone()),
            companies: Collection::new(store.clone()),
            properties: Collection::new(store.clone()),
            reviews: Collection::new(store.clone()),
            review_claims: Collection::new(store.clone()),
            votes: Collection::new(store.clone()),
            reports: Collection::new(store),
        }
    }
}
