use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    Extension, Json,
};
use serde_json::{json, Value};

use crate::database::collection::BOOTCAMPS;
use crate::database::models::{Bootcamp, BootcampInput};
use crate::database::query_builder::BOOTCAMP_COURSES;
use crate::database::{AdvancedQuery, QueryPage, Repository};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::server::AppState;
use crate::services::{BootcampService, PhotoUpload};
use crate::types::Role;

use super::utils::{find_or_404, json_body, query_pairs, JsonBody, QueryPairs};

const PUBLISHERS: [Role; 2] = [Role::Publisher, Role::Admin];

/// GET /api/v1/bootcamps - advanced query, each bootcamp with its courses
pub async fn list(State(state): State<AppState>, query: QueryPairs) -> Result<Json<QueryPage>, ApiError> {
    let params = query_pairs(query)?;
    let query = AdvancedQuery::parse(&BOOTCAMPS, &params, &state.config.filter)?;
    if state.config.filter.debug_logging {
        tracing::debug!("Bootcamp query: {:?}", query);
    }
    let page = query.execute(state.store.as_ref(), &BOOTCAMPS, &[BOOTCAMP_COURSES]).await?;
    Ok(Json(page))
}

/// GET /api/v1/bootcamps/:id
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Bootcamp> {
    let bootcamps: Repository<Bootcamp> = state.repository();
    let bootcamp = find_or_404(&bootcamps, &id).await?;
    Ok(ApiResponse::success(bootcamp))
}

/// POST /api/v1/bootcamps - publisher or admin; publishers get one
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: JsonBody<BootcampInput>,
) -> ApiResult<Bootcamp> {
    user.require_role(&PUBLISHERS)?;
    let input = json_body(body)?;
    input.validate(false)?;

    let bootcamp = BootcampService::new(&state)
        .create(&user.id, user.is_admin(), input)
        .await?;
    Ok(ApiResponse::created(bootcamp))
}

/// PUT /api/v1/bootcamps/:id - owner or admin, partial update
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    body: JsonBody<BootcampInput>,
) -> ApiResult<Bootcamp> {
    user.require_role(&PUBLISHERS)?;
    let bootcamps: Repository<Bootcamp> = state.repository();
    let bootcamp = find_or_404(&bootcamps, &id).await?;
    user.ensure_owner(&bootcamp.user, "update this bootcamp")?;

    let input = json_body(body)?;
    input.validate(true)?;
    let updated = bootcamps
        .update(&id, input.into_document())
        .await?
        .ok_or_else(|| ApiError::resource_not_found(&id))?;
    Ok(ApiResponse::success(updated))
}

/// DELETE /api/v1/bootcamps/:id - owner or admin; takes its courses and reviews along
pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    user.require_role(&PUBLISHERS)?;
    let bootcamps: Repository<Bootcamp> = state.repository();
    let bootcamp = find_or_404(&bootcamps, &id).await?;
    user.ensure_owner(&bootcamp.user, "delete this bootcamp")?;

    BootcampService::new(&state)
        .delete_cascade(&id)
        .await?
        .ok_or_else(|| ApiError::resource_not_found(&id))?;
    Ok(ApiResponse::success(json!({})))
}

/// PUT /api/v1/bootcamps/:id/photo - multipart field `file`
pub async fn upload_photo(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<String> {
    user.require_role(&PUBLISHERS)?;
    let bootcamps: Repository<Bootcamp> = state.repository();
    let bootcamp = find_or_404(&bootcamps, &id).await?;
    user.ensure_owner(&bootcamp.user, "update this bootcamp")?;

    let mut multipart = multipart?;
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await?.to_vec();
        upload = Some(PhotoUpload { file_name, content_type, data });
        break;
    }
    let upload = upload.ok_or_else(|| ApiError::bad_request("Please upload a file"))?;

    let photo = BootcampService::new(&state).upload_photo(&bootcamp, upload).await?;
    Ok(ApiResponse::success(photo))
}
