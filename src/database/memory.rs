use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::database::collection::Collection;
use crate::database::store::{ensure_object_id, Store, StoreError};
use crate::filter::{FilterData, FilterMatch, FilterOrder, FilterWhere};

/// Process-local document store. Collections keep insertion order; a single
/// lock serializes writers, so unique-key checks are atomic with the write.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<&'static str, Vec<Map<String, Value>>>>,
    last_stamp: Mutex<Option<DateTime<Utc>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `createdAt` for a new document; strictly increasing so newest-first
    /// listings never tie
    fn stamp(&self) -> Result<String, StoreError> {
        let mut last = self
            .last_stamp
            .lock()
            .map_err(|_| StoreError::Corrupt("timestamp clock poisoned".to_string()))?;
        let mut now = Utc::now();
        if let Some(prev) = *last {
            if now <= prev {
                now = prev + Duration::microseconds(1);
            }
        }
        *last = Some(now);
        Ok(now.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    fn filtered<'a>(docs: &'a [Map<String, Value>], filter: &FilterData) -> Result<Vec<&'a Map<String, Value>>, StoreError> {
        let conditions = match filter.where_clause {
            Some(ref where_clause) => FilterWhere::parse(where_clause)?,
            None => vec![],
        };
        Ok(docs.iter().filter(|doc| FilterMatch::matches(doc, &conditions)).collect())
    }

    fn check_unique(
        collection: &Collection,
        docs: &[Map<String, Value>],
        candidate: &Map<String, Value>,
    ) -> Result<(), StoreError> {
        let candidate_id = candidate.get("id");
        for key in collection.unique_keys {
            let clash = docs.iter().any(|existing| {
                existing.get("id") != candidate_id
                    && key.iter().all(|field| match (existing.get(*field), candidate.get(*field)) {
                        (Some(a), Some(b)) if !a.is_null() => FilterMatch::equals(a, b),
                        _ => false,
                    })
            });
            if clash {
                return Err(StoreError::Duplicate(format!("{}({})", collection.name, key.join(", "))));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert(&self, collection: &Collection, mut doc: Map<String, Value>) -> Result<Value, StoreError> {
        let id = doc
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::Corrupt("document is missing an id".to_string()))?
            .to_string();
        ensure_object_id(&id)?;

        let mut collections = self.collections.write().await;
        // createdAt is always stamped by the store
        doc.insert("createdAt".into(), Value::String(self.stamp()?));
        let docs = collections.entry(collection.name).or_default();
        if docs.iter().any(|d| d.get("id").and_then(Value::as_str) == Some(id.as_str())) {
            return Err(StoreError::Duplicate(format!("{}(id)", collection.name)));
        }
        Self::check_unique(collection, docs, &doc)?;
        docs.push(doc.clone());
        Ok(Value::Object(doc))
    }

    async fn find(&self, collection: &Collection, filter: FilterData) -> Result<Vec<Value>, StoreError> {
        let order = match filter.order {
            Some(ref order) => FilterOrder::validate_and_parse(order)?,
            None => vec![],
        };

        let collections = self.collections.read().await;
        let docs = collections.get(collection.name).map(Vec::as_slice).unwrap_or(&[]);
        let mut matched: Vec<Value> = Self::filtered(docs, &filter)?
            .into_iter()
            .map(|d| Value::Object(d.clone()))
            .collect();
        drop(collections);

        FilterMatch::sort(&mut matched, &order);

        let offset = filter.offset.unwrap_or(0).max(0) as usize;
        let limit = filter.limit.map(|l| l.max(0) as usize).unwrap_or(usize::MAX);
        let select = filter.select.unwrap_or_default();

        Ok(matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|doc| match doc {
                Value::Object(map) => Value::Object(FilterMatch::project(&map, &select)),
                other => other,
            })
            .collect())
    }

    async fn find_by_id(&self, collection: &Collection, id: &str) -> Result<Option<Value>, StoreError> {
        ensure_object_id(id)?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection.name)
            .and_then(|docs| docs.iter().find(|d| d.get("id").and_then(Value::as_str) == Some(id)))
            .map(|d| Value::Object(d.clone())))
    }

    async fn count(&self, collection: &Collection, filter: FilterData) -> Result<u64, StoreError> {
        let collections = self.collections.read().await;
        let docs = collections.get(collection.name).map(Vec::as_slice).unwrap_or(&[]);
        Ok(Self::filtered(docs, &filter)?.len() as u64)
    }

    async fn update(&self, collection: &Collection, id: &str, patch: Map<String, Value>) -> Result<Option<Value>, StoreError> {
        ensure_object_id(id)?;
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.name).or_default();
        let Some(index) = docs.iter().position(|d| d.get("id").and_then(Value::as_str) == Some(id)) else {
            return Ok(None);
        };

        let mut updated = docs[index].clone();
        for (key, value) in patch {
            if key != "id" {
                updated.insert(key, value);
            }
        }
        Self::check_unique(collection, docs, &updated)?;
        docs[index] = updated.clone();
        Ok(Some(Value::Object(updated)))
    }

    async fn delete(&self, collection: &Collection, id: &str) -> Result<Option<Value>, StoreError> {
        ensure_object_id(id)?;
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection.name) else {
            return Ok(None);
        };
        Ok(docs
            .iter()
            .position(|d| d.get("id").and_then(Value::as_str) == Some(id))
            .map(|index| Value::Object(docs.remove(index))))
    }

    async fn delete_all(&self, collection: &Collection) -> Result<u64, StoreError> {
        let mut collections = self.collections.write().await;
        Ok(collections.remove(collection.name).map(|docs| docs.len() as u64).unwrap_or(0))
    }

    async fn average(&self, collection: &Collection, field: &str, filter: FilterData) -> Result<Option<f64>, StoreError> {
        let collections = self.collections.read().await;
        let docs = collections.get(collection.name).map(Vec::as_slice).unwrap_or(&[]);
        let values: Vec<f64> = Self::filtered(docs, &filter)?
            .into_iter()
            .filter_map(|d| d.get(field).and_then(Value::as_f64))
            .collect();

        if values.is_empty() {
            return Ok(None);
        }
        Ok(Some(values.iter().sum::<f64>() / values.len() as f64))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
