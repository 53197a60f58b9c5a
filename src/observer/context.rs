use std::sync::Arc;

use serde_json::Value;

use crate::database::store::Store;
use crate::observer::error::ObserverError;
use crate::types::Operation;

/// A persisted create/update/delete on one document
#[derive(Debug, Clone)]
pub struct MutationEvent {
    pub operation: Operation,
    pub collection: &'static str,
    /// Document as stored after the write, or as it was before a delete
    pub document: Value,
}

impl MutationEvent {
    pub fn new(operation: Operation, collection: &'static str, document: Value) -> Self {
        Self { operation, collection, document }
    }

    pub fn document_id(&self) -> Option<&str> {
        self.document.get("id").and_then(Value::as_str)
    }
}

/// What every observer sees: the event plus a handle on the store
pub struct ObserverContext {
    pub event: MutationEvent,
    pub store: Arc<dyn Store>,
}

impl ObserverContext {
    pub fn new(event: MutationEvent, store: Arc<dyn Store>) -> Self {
        Self { event, store }
    }

    /// String-valued reference field on the mutated document
    pub fn reference(&self, field: &str) -> Result<&str, ObserverError> {
        self.event
            .document
            .get(field)
            .and_then(Value::as_str)
            .ok_or_else(|| ObserverError::InvalidEvent(format!("{} document has no {}", self.event.collection, field)))
    }
}
