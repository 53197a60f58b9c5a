// Ring 6: keeps bootcamps.averageCost in step with the bootcamp's courses
use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::database::collection::{BOOTCAMPS, COURSES};
use crate::database::store::{Store, StoreError};
use crate::filter::FilterData;
use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, ObserverRing, PostDatabaseObserver};
use crate::types::Operation;

/// Recompute `averageCost` after any course write
#[derive(Default)]
pub struct AverageCost;

impl Observer for AverageCost {
    fn name(&self) -> &'static str {
        "AverageCost"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::PostDatabase
    }

    fn applies_to_operation(&self, _op: Operation) -> bool {
        true
    }

    fn applies_to_collection(&self, collection: &str) -> bool {
        collection == COURSES.name
    }
}

#[async_trait]
impl PostDatabaseObserver for AverageCost {
    async fn execute(&self, ctx: &ObserverContext) -> Result<(), ObserverError> {
        let bootcamp_id = ctx.reference("bootcamp")?;
        let average = recompute_cost(ctx.store.as_ref(), bootcamp_id).await?;
        tracing::info!("Bootcamp {} averageCost -> {:?}", bootcamp_id, average);
        Ok(())
    }
}

/// Mean course tuition rounded up to the next multiple of ten.
/// A bootcamp without courses has its average cleared.
pub async fn recompute_cost(store: &dyn Store, bootcamp_id: &str) -> Result<Option<f64>, StoreError> {
    let mean = store
        .average(&COURSES, "tuition", FilterData::by_field("bootcamp", bootcamp_id))
        .await?;
    let average = mean.map(round_up_to_ten);

    let mut patch = Map::new();
    patch.insert("averageCost".to_string(), average.map(Value::from).unwrap_or(Value::Null));
    store.update(&BOOTCAMPS, bootcamp_id, patch).await?;
    Ok(average)
}

fn round_up_to_ten(mean: f64) -> f64 {
    (mean / 10.0).ceil() * 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_up_to_next_ten() {
        assert_eq!(round_up_to_ten(1075.0), 1080.0);
        assert_eq!(round_up_to_ten(950.0), 950.0);
        assert_eq!(round_up_to_ten(0.5), 10.0);
    }
}
