use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Query};

use crate::database::models::Model;
use crate::database::Repository;
use crate::error::ApiError;

/// Raw query-string pairs, in request order
pub type QueryPairs = Result<Query<Vec<(String, String)>>, QueryRejection>;

pub type JsonBody<T> = Result<Json<T>, JsonRejection>;

pub fn query_pairs(query: QueryPairs) -> Result<Vec<(String, String)>, ApiError> {
    let Query(pairs) = query?;
    Ok(pairs)
}

pub fn json_body<T>(body: JsonBody<T>) -> Result<T, ApiError> {
    let Json(value) = body?;
    Ok(value)
}

/// Fetch by id or fail with the standard 404
pub async fn find_or_404<T: Model>(repository: &Repository<T>, id: &str) -> Result<T, ApiError> {
    repository
        .select_id(id)
        .await?
        .ok_or_else(|| ApiError::resource_not_found(id))
}
