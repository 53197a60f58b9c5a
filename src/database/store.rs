use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::database::collection::Collection;
use crate::filter::{FilterData, FilterError};

/// Errors raised by any store backend
#[derive(Debug, Error)]
pub enum StoreError {
    /// Identifier is not a well-formed document id
    #[error("Malformed identifier: {0}")]
    InvalidId(String),

    /// A unique key would be violated
    #[error("Duplicate key: {0}")]
    Duplicate(String),

    /// Field-level validation messages, in field order
    #[error("Validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Query error: {0}")]
    Query(#[from] FilterError),

    #[error("Unexpected document shape: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Document store seam. Documents are JSON objects keyed by `id`; the store
/// stamps `createdAt` on insert.
#[async_trait]
pub trait Store: Send + Sync {
    async fn insert(&self, collection: &Collection, doc: Map<String, Value>) -> Result<Value, StoreError>;

    async fn find(&self, collection: &Collection, filter: FilterData) -> Result<Vec<Value>, StoreError>;

    async fn find_by_id(&self, collection: &Collection, id: &str) -> Result<Option<Value>, StoreError>;

    async fn count(&self, collection: &Collection, filter: FilterData) -> Result<u64, StoreError>;

    /// Apply `patch` field by field; `None` when no document has that id
    async fn update(&self, collection: &Collection, id: &str, patch: Map<String, Value>) -> Result<Option<Value>, StoreError>;

    async fn delete(&self, collection: &Collection, id: &str) -> Result<Option<Value>, StoreError>;

    async fn delete_all(&self, collection: &Collection) -> Result<u64, StoreError>;

    /// Mean of a numeric field across matching documents; `None` for an empty set
    async fn average(&self, collection: &Collection, field: &str, filter: FilterData) -> Result<Option<f64>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

/// Generate a fresh document id
pub fn new_object_id() -> String {
    Uuid::new_v4().to_string()
}

/// Reject identifiers that could never name a document
pub fn ensure_object_id(id: &str) -> Result<(), StoreError> {
    Uuid::parse_str(id)
        .map(|_| ())
        .map_err(|_| StoreError::InvalidId(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_ids_round_trip() {
        let id = new_object_id();
        assert!(ensure_object_id(&id).is_ok());
        assert!(matches!(ensure_object_id("5d713995b721c3bb38c1f5d0x"), Err(StoreError::InvalidId(_))));
    }

    #[test]
    fn validation_message_joins_fields() {
        let err = StoreError::Validation(vec!["Please add a name".into(), "Please add an address".into()]);
        assert_eq!(err.to_string(), "Validation failed: Please add a name, Please add an address");
    }
}
