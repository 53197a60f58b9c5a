use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::time::timeout;

use crate::config::AppConfig;
use crate::database::store::Store;
use crate::observer::context::{MutationEvent, ObserverContext};
use crate::observer::error::ObserverError;
use crate::observer::implementations::{AuditLog, AverageCost, AverageRating};
use crate::observer::traits::{ObserverBox, ObserverRing};

/// Runs registered observers ring by ring for each mutation event.
/// Observer failures never propagate to the caller that caused the write;
/// they are logged and handed back for inspection.
pub struct ObserverPipeline {
    observers: HashMap<ObserverRing, Vec<ObserverBox>>,
}

impl ObserverPipeline {
    /// Create new observer pipeline with empty observer registry
    pub fn new() -> Self {
        Self {
            observers: HashMap::new(),
        }
    }

    /// Pipeline with the aggregate observers, plus audit logging when enabled
    pub fn standard(config: &AppConfig) -> Self {
        let mut pipeline = Self::new();
        pipeline.register_observer(ObserverBox::PostDatabase(Box::new(AverageCost)));
        pipeline.register_observer(ObserverBox::PostDatabase(Box::new(AverageRating)));
        if config.security.enable_audit_logging {
            pipeline.register_observer(ObserverBox::Audit(Box::new(AuditLog)));
        }
        pipeline
    }

    pub fn register_observer(&mut self, observer: ObserverBox) {
        let ring = observer.ring();
        let name = observer.name();
        let ring_observers = self.observers.entry(ring).or_default();
        ring_observers.push(observer);
        ring_observers.sort_by_key(ObserverBox::priority);

        tracing::debug!("Registered observer '{}' for ring {:?}", name, ring);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.values().map(Vec::len).sum()
    }

    /// Deliver one event to every applicable observer
    pub async fn dispatch(&self, event: MutationEvent, store: Arc<dyn Store>) -> Vec<ObserverError> {
        let ctx = ObserverContext::new(event, store);
        let mut errors = vec![];

        for ring in ObserverRing::ALL {
            self.execute_ring(ring, &ctx, &mut errors).await;
        }
        errors
    }

    async fn execute_ring(&self, ring: ObserverRing, ctx: &ObserverContext, errors: &mut Vec<ObserverError>) {
        let Some(observers) = self.observers.get(&ring) else {
            return;
        };

        for observer in observers {
            if !observer.applies_to(ctx.event.operation, ctx.event.collection) {
                tracing::trace!(
                    "Observer {} skipped for {:?} on {}",
                    observer.name(), ctx.event.operation, ctx.event.collection
                );
                continue;
            }

            let observer_start = Instant::now();
            match timeout(observer.timeout(), observer.execute(ctx)).await {
                Ok(Ok(())) => {
                    tracing::debug!(
                        "Observer: {} completed successfully in {:?}",
                        observer.name(), observer_start.elapsed()
                    );
                }
                Ok(Err(error)) => {
                    tracing::error!("Observer: {} failed: {}", observer.name(), error);
                    errors.push(error);
                }
                Err(_elapsed) => {
                    tracing::error!("Observer: {} timed out after {:?}", observer.name(), observer.timeout());
                    errors.push(ObserverError::TimeoutError(format!(
                        "Observer {} timed out after {:?}",
                        observer.name(), observer.timeout()
                    )));
                }
            }
        }
    }
}

impl Default for ObserverPipeline {
    fn default() -> Self {
        Self::new()
    }
}
