use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::database::models::Model;
use crate::database::store::{new_object_id, Store, StoreError};
use crate::filter::FilterData;
use crate::observer::{MutationEvent, ObserverPipeline};
use crate::types::Operation;

/// Typed access to one collection. Every successful write is followed by a
/// mutation event through the observer pipeline.
pub struct Repository<T> {
    store: Arc<dyn Store>,
    pipeline: Arc<ObserverPipeline>,
    _phantom: PhantomData<T>,
}

impl<T: Model> Repository<T> {
    pub fn new(store: Arc<dyn Store>, pipeline: Arc<ObserverPipeline>) -> Self {
        Self {
            store,
            pipeline,
            _phantom: PhantomData,
        }
    }

    pub async fn select_any(&self, filter_data: FilterData) -> Result<Vec<T>, StoreError> {
        let docs = self.store.find(T::COLLECTION, filter_data).await?;
        docs.into_iter().map(Self::decode).collect()
    }

    pub async fn select_one(&self, filter_data: FilterData) -> Result<Option<T>, StoreError> {
        let filter_data = FilterData {
            limit: Some(1),
            ..filter_data
        };
        Ok(self.select_any(filter_data).await?.into_iter().next())
    }

    pub async fn select_id(&self, id: &str) -> Result<Option<T>, StoreError> {
        self.store
            .find_by_id(T::COLLECTION, id)
            .await?
            .map(Self::decode)
            .transpose()
    }

    pub async fn count(&self, filter_data: FilterData) -> Result<u64, StoreError> {
        self.store.count(T::COLLECTION, filter_data).await
    }

    /// Insert a new document; an id is assigned unless the caller brought one
    pub async fn create(&self, mut doc: Map<String, Value>) -> Result<T, StoreError> {
        if !doc.contains_key("id") {
            doc.insert("id".into(), Value::String(new_object_id()));
        }
        let stored = self.store.insert(T::COLLECTION, doc).await?;
        tracing::info!("Created {} {}", T::COLLECTION.name, stored["id"]);
        self.emit(Operation::Create, stored.clone()).await;
        Self::decode(stored)
    }

    pub async fn update(&self, id: &str, patch: Map<String, Value>) -> Result<Option<T>, StoreError> {
        let Some(stored) = self.store.update(T::COLLECTION, id, patch).await? else {
            return Ok(None);
        };
        tracing::info!("Updated {} {}", T::COLLECTION.name, id);
        self.emit(Operation::Update, stored.clone()).await;
        Self::decode(stored).map(Some)
    }

    pub async fn delete(&self, id: &str) -> Result<Option<T>, StoreError> {
        let Some(removed) = self.store.delete(T::COLLECTION, id).await? else {
            return Ok(None);
        };
        tracing::info!("Deleted {} {}", T::COLLECTION.name, id);
        self.emit(Operation::Delete, removed.clone()).await;
        Self::decode(removed).map(Some)
    }

    /// Bulk removal without events; only the seeder uses this
    pub async fn delete_all(&self) -> Result<u64, StoreError> {
        self.store.delete_all(T::COLLECTION).await
    }

    async fn emit(&self, operation: Operation, document: Value) {
        let event = MutationEvent::new(operation, T::COLLECTION.name, document);
        let errors = self.pipeline.dispatch(event, self.store.clone()).await;
        if !errors.is_empty() {
            tracing::warn!(
                "{} observer error(s) after {:?} on {}",
                errors.len(), operation, T::COLLECTION.name
            );
        }
    }

    fn decode(doc: Value) -> Result<T, StoreError> {
        serde_json::from_value(doc)
            .map_err(|e| StoreError::Corrupt(format!("{} document: {}", T::COLLECTION.name, e)))
    }
}
