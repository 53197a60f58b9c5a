use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::{validate_jwt, AuthError};
use crate::database::models::User;
use crate::database::{Repository, StoreError};
use crate::error::ApiError;
use crate::server::AppState;
use crate::types::Role;

/// Authenticated caller, injected into request extensions by [`protect`]
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: String,
    pub role: Role,
    pub name: String,
    pub email: String,
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            role: user.role,
            name: user.name,
            email: user.email,
        }
    }
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// 403 unless the caller holds one of `roles`
    pub fn require_role(&self, roles: &[Role]) -> Result<(), ApiError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!(
                "User role {} is not authorized to access this route",
                self.role
            )))
        }
    }

    /// 403 unless the caller is an admin or owns the resource
    pub fn ensure_owner(&self, owner_id: &str, action: &str) -> Result<(), ApiError> {
        if self.is_admin() || self.id == owner_id {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!("User {} is not authorized to {}", self.id, action)))
        }
    }
}

/// Bearer-token authentication; the token's subject must still exist
pub async fn protect(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers)?;
    let claims = validate_jwt(&state.config.security, token)?;

    let users: Repository<User> = state.repository();
    let user = match users.select_id(&claims.sub).await {
        Ok(user) => user,
        // A subject that is not even an id cannot name a user
        Err(StoreError::InvalidId(_)) => None,
        Err(err) => return Err(err.into()),
    }
    .ok_or(AuthError::InvalidToken)?;

    request.extensions_mut().insert(AuthUser::from(user));
    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_str = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AuthError::MissingToken),
    }
}
