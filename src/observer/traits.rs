use async_trait::async_trait;
use std::time::Duration;

use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::types::Operation;

/// Observer rings run in ascending order after a mutation has been persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ObserverRing {
    PostDatabase = 6,       // Derived fields on related documents
    Audit = 7,              // Change tracking
}

impl ObserverRing {
    pub const ALL: [ObserverRing; 2] = [ObserverRing::PostDatabase, ObserverRing::Audit];
}

/// Base trait for all observers with metadata and applicability checks
pub trait Observer: Send + Sync {
    /// Observer name for logging and debugging
    fn name(&self) -> &'static str;

    /// Which ring this observer belongs to
    fn ring(&self) -> ObserverRing;

    fn applies_to_operation(&self, op: Operation) -> bool;

    /// Check if observer applies to this collection
    fn applies_to_collection(&self, collection: &str) -> bool;

    /// Execution timeout (default 5 seconds)
    fn timeout(&self) -> Duration {
        Duration::from_secs(5)
    }

    /// Priority within ring (lower numbers execute first)
    fn priority(&self) -> u8 {
        50
    }
}

/// Ring 6: Post-Database - immediate processing after a write
#[async_trait]
pub trait PostDatabaseObserver: Observer {
    async fn execute(&self, ctx: &ObserverContext) -> Result<(), ObserverError>;
}

/// Ring 7: Audit - change tracking
#[async_trait]
pub trait AuditObserver: Observer {
    async fn execute(&self, ctx: &ObserverContext) -> Result<(), ObserverError>;
}

/// Concrete observer types for dynamic dispatch
pub enum ObserverBox {
    PostDatabase(Box<dyn PostDatabaseObserver>),
    Audit(Box<dyn AuditObserver>),
}

impl ObserverBox {
    pub fn name(&self) -> &'static str {
        match self {
            ObserverBox::PostDatabase(o) => o.name(),
            ObserverBox::Audit(o) => o.name(),
        }
    }

    pub fn ring(&self) -> ObserverRing {
        match self {
            ObserverBox::PostDatabase(o) => o.ring(),
            ObserverBox::Audit(o) => o.ring(),
        }
    }

    pub fn priority(&self) -> u8 {
        match self {
            ObserverBox::PostDatabase(o) => o.priority(),
            ObserverBox::Audit(o) => o.priority(),
        }
    }

    pub fn timeout(&self) -> Duration {
        match self {
            ObserverBox::PostDatabase(o) => o.timeout(),
            ObserverBox::Audit(o) => o.timeout(),
        }
    }

    pub fn applies_to(&self, op: Operation, collection: &str) -> bool {
        match self {
            ObserverBox::PostDatabase(o) => o.applies_to_operation(op) && o.applies_to_collection(collection),
            ObserverBox::Audit(o) => o.applies_to_operation(op) && o.applies_to_collection(collection),
        }
    }

    pub async fn execute(&self, ctx: &ObserverContext) -> Result<(), ObserverError> {
        match self {
            ObserverBox::PostDatabase(o) => o.execute(ctx).await,
            ObserverBox::Audit(o) => o.execute(ctx).await,
        }
    }
}
