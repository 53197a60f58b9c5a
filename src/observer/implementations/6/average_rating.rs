// Ring 6: keeps bootcamps.averageRating in step with the bootcamp's reviews
use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::database::collection::{BOOTCAMPS, REVIEWS};
use crate::database::store::{Store, StoreError};
use crate::filter::FilterData;
use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, ObserverRing, PostDatabaseObserver};
use crate::types::Operation;

/// Recompute `averageRating` after any review write
#[derive(Default)]
pub struct AverageRating;

impl Observer for AverageRating {
    fn name(&self) -> &'static str {
        "AverageRating"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::PostDatabase
    }

    fn applies_to_operation(&self, _op: Operation) -> bool {
        true
    }

    fn applies_to_collection(&self, collection: &str) -> bool {
        collection == REVIEWS.name
    }
}

#[async_trait]
impl PostDatabaseObserver for AverageRating {
    async fn execute(&self, ctx: &ObserverContext) -> Result<(), ObserverError> {
        let bootcamp_id = ctx.reference("bootcamp")?;
        let average = recompute_rating(ctx.store.as_ref(), bootcamp_id).await?;
        tracing::info!("Bootcamp {} averageRating -> {:?}", bootcamp_id, average);
        Ok(())
    }
}

/// Plain mean of review ratings; cleared when no reviews remain
pub async fn recompute_rating(store: &dyn Store, bootcamp_id: &str) -> Result<Option<f64>, StoreError> {
    let average = store
        .average(&REVIEWS, "rating", FilterData::by_field("bootcamp", bootcamp_id))
        .await?;

    let mut patch = Map::new();
    patch.insert("averageRating".to_string(), average.map(Value::from).unwrap_or(Value::Null));
    store.update(&BOOTCAMPS, bootcamp_id, patch).await?;
    Ok(average)
}
