// Ring 7: structured change log of every mutation
use async_trait::async_trait;

use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{AuditObserver, Observer, ObserverRing};
use crate::types::Operation;

#[derive(Default)]
pub struct AuditLog;

impl Observer for AuditLog {
    fn name(&self) -> &'static str {
        "AuditLog"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Audit
    }

    fn applies_to_operation(&self, _op: Operation) -> bool {
        true
    }

    fn applies_to_collection(&self, _collection: &str) -> bool {
        true
    }

    fn priority(&self) -> u8 {
        90
    }
}

#[async_trait]
impl AuditObserver for AuditLog {
    async fn execute(&self, ctx: &ObserverContext) -> Result<(), ObserverError> {
        let event = &ctx.event;
        tracing::info!(
            target: "audit",
            operation = ?event.operation,
            collection = event.collection,
            id = event.document_id().unwrap_or("-"),
            owner = event.document.get("user").and_then(|u| u.as_str()).unwrap_or("-"),
            "document mutated"
        );
        Ok(())
    }
}
