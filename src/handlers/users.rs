//! Account endpoints: login (public), registration, listing, and the
//! current-user probe.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use sea_orm::{EntityTrait, QueryOrder};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::AuthUser;
use crate::entities::user::{self, Entity as UserEntity, Role};
use crate::errors::{ErrorResponse, ServiceError};
use crate::handlers::ApiJson;
use crate::{ApiResponse, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/register", post(register))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 64))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    #[schema(value_type = Object)]
    pub user: user::Model,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    pub role: String,
}

/// Verify credentials and issue a bearer token.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 401, description = "Bad credentials", body = ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ServiceError> {
    payload.validate()?;

    let (token, account) = state.auth.login(&payload.username, &payload.password).await?;
    Ok(Json(LoginResponse {
        access_token: token.access_token,
        token_type: token.token_type,
        expires_in: token.expires_in,
        user: account,
    }))
}

/// Create an account. Admin only.
pub async fn register(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require(Role::Admin)?;
    payload.validate()?;

    let role = Role::parse(&payload.role)
        .ok_or_else(|| ServiceError::InvalidInput(format!("Unknown role '{}'", payload.role)))?;

    let created = state
        .auth
        .create_user(&payload.username, &payload.email, &payload.password, role)
        .await?;

    Ok((StatusCode::CREATED, ApiResponse::ok(created)))
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<Vec<user::Model>>>, ServiceError> {
    user.require(Role::Supervisor)?;

    let accounts = UserEntity::find()
        .order_by_asc(user::Column::Username)
        .all(&*state.db)
        .await?;
    Ok(ApiResponse::ok(accounts))
}

/// The authenticated user's own record.
pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<user::Model>>, ServiceError> {
    let account = UserEntity::find_by_id(user.user_id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| ServiceError::NotFound("User not found".into()))?;
    Ok(ApiResponse::ok(account))
}
