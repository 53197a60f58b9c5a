use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde_json::{json, Value};

use crate::database::collection::COURSES;
use crate::database::models::{Bootcamp, Course, CourseInput};
use crate::database::query_builder::{populate_documents, BOOTCAMP_SUMMARY};
use crate::database::{AdvancedQuery, QueryPage, Repository};
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::server::AppState;
use crate::types::Role;

use super::utils::{find_or_404, json_body, query_pairs, JsonBody, QueryPairs};

const PUBLISHERS: [Role; 2] = [Role::Publisher, Role::Admin];

/// GET /api/v1/courses - advanced query, bootcamp name and description embedded
pub async fn list(State(state): State<AppState>, query: QueryPairs) -> Result<Json<QueryPage>, ApiError> {
    let params = query_pairs(query)?;
    let query = AdvancedQuery::parse(&COURSES, &params, &state.config.filter)?;
    let page = query.execute(state.store.as_ref(), &COURSES, &[BOOTCAMP_SUMMARY]).await?;
    Ok(Json(page))
}

/// GET /api/v1/bootcamps/:id/courses - every course of one bootcamp, unpaged
pub async fn list_for_bootcamp(State(state): State<AppState>, Path(bootcamp_id): Path<String>) -> Result<Json<Value>, ApiError> {
    let courses: Repository<Course> = state.repository();
    let filter = FilterData {
        order: Some(json!("createdAt")),
        ..FilterData::by_field("bootcamp", bootcamp_id.as_str())
    };
    let data = courses.select_any(filter).await?;

    Ok(Json(json!({
        "success": true,
        "count": data.len(),
        "data": data,
    })))
}

/// GET /api/v1/courses/:id
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let mut doc = state
        .store
        .find_by_id(&COURSES, &id)
        .await?
        .ok_or_else(|| ApiError::resource_not_found(&id))?;
    populate_documents(state.store.as_ref(), std::slice::from_mut(&mut doc), &BOOTCAMP_SUMMARY).await?;
    Ok(ApiResponse::success(doc))
}

/// POST /api/v1/bootcamps/:id/courses - bootcamp owner or admin
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(bootcamp_id): Path<String>,
    body: JsonBody<CourseInput>,
) -> ApiResult<Course> {
    user.require_role(&PUBLISHERS)?;
    let bootcamps: Repository<Bootcamp> = state.repository();
    let bootcamp = find_or_404(&bootcamps, &bootcamp_id).await?;
    user.ensure_owner(&bootcamp.user, &format!("add a course to bootcamp {}", bootcamp.id))?;

    let input = json_body(body)?;
    input.validate(false)?;
    let courses: Repository<Course> = state.repository();
    let course = courses.create(input.into_new_document(&bootcamp.id, &user.id)).await?;
    Ok(ApiResponse::created(course))
}

/// PUT /api/v1/courses/:id - course owner or admin
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    body: JsonBody<CourseInput>,
) -> ApiResult<Course> {
    user.require_role(&PUBLISHERS)?;
    let courses: Repository<Course> = state.repository();
    let course = find_or_404(&courses, &id).await?;
    user.ensure_owner(&course.user, &format!("update course {}", course.id))?;

    let input = json_body(body)?;
    input.validate(true)?;
    let updated = courses
        .update(&id, input.into_document())
        .await?
        .ok_or_else(|| ApiError::resource_not_found(&id))?;
    Ok(ApiResponse::success(updated))
}

/// DELETE /api/v1/courses/:id - course owner or admin
pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    user.require_role(&PUBLISHERS)?;
    let courses: Repository<Course> = state.repository();
    let course = find_or_404(&courses, &id).await?;
    user.ensure_owner(&course.user, &format!("delete course {}", course.id))?;

    courses.delete(&id).await?;
    Ok(ApiResponse::success(json!({})))
}
