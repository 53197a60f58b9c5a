use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde_json::{json, Value};

use crate::database::collection::REVIEWS;
use crate::database::models::{Bootcamp, Review, ReviewInput};
use crate::database::query_builder::{populate_documents, BOOTCAMP_SUMMARY};
use crate::database::{AdvancedQuery, QueryPage, Repository};
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::server::AppState;
use crate::types::Role;

use super::utils::{find_or_404, json_body, query_pairs, JsonBody, QueryPairs};

const REVIEWERS: [Role; 2] = [Role::User, Role::Admin];

/// GET /api/v1/reviews - advanced query, bootcamp name and description embedded
pub async fn list(State(state): State<AppState>, query: QueryPairs) -> Result<Json<QueryPage>, ApiError> {
    let params = query_pairs(query)?;
    let query = AdvancedQuery::parse(&REVIEWS, &params, &state.config.filter)?;
    let page = query.execute(state.store.as_ref(), &REVIEWS, &[BOOTCAMP_SUMMARY]).await?;
    Ok(Json(page))
}

/// GET /api/v1/bootcamps/:id/reviews
pub async fn list_for_bootcamp(State(state): State<AppState>, Path(bootcamp_id): Path<String>) -> Result<Json<Value>, ApiError> {
    let reviews: Repository<Review> = state.repository();
    let filter = FilterData {
        order: Some(json!("createdAt")),
        ..FilterData::by_field("bootcamp", bootcamp_id.as_str())
    };
    let data = reviews.select_any(filter).await?;

    Ok(Json(json!({
        "success": true,
        "count": data.len(),
        "data": data,
    })))
}

/// GET /api/v1/reviews/:id
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let mut doc = state
        .store
        .find_by_id(&REVIEWS, &id)
        .await?
        .ok_or_else(|| ApiError::resource_not_found(&id))?;
    populate_documents(state.store.as_ref(), std::slice::from_mut(&mut doc), &BOOTCAMP_SUMMARY).await?;
    Ok(ApiResponse::success(doc))
}

/// POST /api/v1/bootcamps/:id/reviews - one review per user per bootcamp
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(bootcamp_id): Path<String>,
    body: JsonBody<ReviewInput>,
) -> ApiResult<Review> {
    user.require_role(&REVIEWERS)?;
    let bootcamps: Repository<Bootcamp> = state.repository();
    let bootcamp = find_or_404(&bootcamps, &bootcamp_id).await?;

    let input = json_body(body)?;
    input.validate(false)?;
    let reviews: Repository<Review> = state.repository();
    let review = reviews.create(input.into_new_document(&bootcamp.id, &user.id)).await?;
    Ok(ApiResponse::created(review))
}

/// PUT /api/v1/reviews/:id - author or admin
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    body: JsonBody<ReviewInput>,
) -> ApiResult<Review> {
    user.require_role(&REVIEWERS)?;
    let reviews: Repository<Review> = state.repository();
    let review = find_or_404(&reviews, &id).await?;
    user.ensure_owner(&review.user, &format!("update review {}", review.id))?;

    let input = json_body(body)?;
    input.validate(true)?;
    let updated = reviews
        .update(&id, input.into_document())
        .await?
        .ok_or_else(|| ApiError::resource_not_found(&id))?;
    Ok(ApiResponse::success(updated))
}

/// DELETE /api/v1/reviews/:id - author or admin
pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    user.require_role(&REVIEWERS)?;
    let reviews: Repository<Review> = state.repository();
    let review = find_or_404(&reviews, &id).await?;
    user.ensure_owner(&review.user, &format!("delete review {}", review.id))?;

    reviews.delete(&id).await?;
    Ok(ApiResponse::success(json!({})))
}
