use thiserror::Error;

use crate::database::store::StoreError;

/// Observer system errors
#[derive(Debug, Error, Clone)]
pub enum ObserverError {
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Timeout error: {0}")]
    TimeoutError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<StoreError> for ObserverError {
    fn from(error: StoreError) -> Self {
        ObserverError::DatabaseError(error.to_string())
    }
}
