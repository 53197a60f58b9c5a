use axum::{extract::State, http::StatusCode, Extension, Json};
use serde_json::{json, Value};

use crate::auth::{hash_password, issue_token, verify_password, AuthError};
use crate::database::models::{LoginInput, RegisterInput, User};
use crate::database::Repository;
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::server::AppState;

use super::utils::{find_or_404, json_body, JsonBody};

type TokenResponse = Result<(StatusCode, Json<Value>), ApiError>;

fn token_response(state: &AppState, user: &User, status: StatusCode) -> TokenResponse {
    let token = issue_token(&state.config.security, &user.id, user.role)?;
    Ok((status, Json(json!({ "success": true, "token": token }))))
}

/// POST /api/v1/auth/register - user or publisher accounts only
pub async fn register(State(state): State<AppState>, body: JsonBody<RegisterInput>) -> TokenResponse {
    let input = json_body(body)?;
    input.validate()?;

    let password = input.password.clone().unwrap_or_default();
    let hash = hash_password(&state.config.security, &password)?;

    let users: Repository<User> = state.repository();
    let user = users.create(input.into_document(hash)).await?;
    tracing::info!("Registered {} as {}", user.email, user.role);

    token_response(&state, &user, StatusCode::OK)
}

/// POST /api/v1/auth/login
pub async fn login(State(state): State<AppState>, body: JsonBody<LoginInput>) -> TokenResponse {
    let input = json_body(body)?;
    let (Some(email), Some(password)) = (input.email, input.password) else {
        return Err(ApiError::bad_request("Please provide an email and password"));
    };

    let users: Repository<User> = state.repository();
    let user = users
        .select_one(FilterData::by_field("email", email.trim().to_lowercase()))
        .await?
        .ok_or(AuthError::InvalidCredentials)?;
    verify_password(&password, &user.password)?;

    token_response(&state, &user, StatusCode::OK)
}

/// GET /api/v1/auth/me
pub async fn me(State(state): State<AppState>, Extension(caller): Extension<AuthUser>) -> ApiResult<User> {
    let users: Repository<User> = state.repository();
    let user = find_or_404(&users, &caller.id).await?;
    Ok(ApiResponse::success(user))
}
