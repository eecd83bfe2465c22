use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthUser;
use crate::entities::part;
use crate::entities::user::Role;
use crate::errors::ServiceError;
use crate::handlers::ApiJson;
use crate::services::parts::{CreatePart, UpdatePart};
use crate::{ApiResponse, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_parts).post(create_part))
        .route("/:id", get(get_part).put(update_part).delete(delete_part))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePartRequest {
    #[validate(length(min = 1, max = 64))]
    pub part_number: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default)]
    pub min_qty: i32,
    #[serde(default)]
    pub max_qty: i32,
}

fn default_unit() -> String {
    "pcs".to_string()
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePartRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub min_qty: Option<i32>,
    #[serde(default)]
    pub max_qty: Option<i32>,
}

pub async fn create_part(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<CreatePartRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require(Role::Supervisor)?;
    payload.validate()?;

    let created = state
        .parts
        .create_part(CreatePart {
            part_number: payload.part_number,
            name: payload.name,
            unit: payload.unit,
            min_qty: payload.min_qty,
            max_qty: payload.max_qty,
        })
        .await?;

    Ok((StatusCode::CREATED, ApiResponse::ok(created)))
}

pub async fn list_parts(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<part::Model>>>, ServiceError> {
    Ok(ApiResponse::ok(state.parts.list_parts().await?))
}

pub async fn get_part(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<part::Model>>, ServiceError> {
    Ok(ApiResponse::ok(state.parts.get_part(id).await?))
}

pub async fn update_part(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<UpdatePartRequest>,
) -> Result<Json<ApiResponse<part::Model>>, ServiceError> {
    user.require(Role::Supervisor)?;
    payload.validate()?;

    let updated = state
        .parts
        .update_part(
            id,
            UpdatePart {
                name: payload.name,
                unit: payload.unit,
                min_qty: payload.min_qty,
                max_qty: payload.max_qty,
            },
        )
        .await?;

    Ok(ApiResponse::ok(updated))
}

pub async fn delete_part(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse>, ServiceError> {
    user.require(Role::Admin)?;
    state.parts.delete_part(id).await?;
    Ok(ApiResponse::message("Part deleted"))
}
