// Observer implementations organized by rings

// Ring 6: Post-Database - derived bootcamp aggregates
#[path = "6/average_cost.rs"]
pub mod average_cost;
#[path = "6/average_rating.rs"]
pub mod average_rating;

// Ring 7: Audit
#[path = "7/audit_log.rs"]
pub mod audit_log;

pub use average_cost::{recompute_cost, AverageCost};
pub use average_rating::{recompute_rating, AverageRating};
pub use audit_log::AuditLog;
