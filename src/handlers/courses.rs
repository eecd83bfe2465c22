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
use crate::entities::golf_course;
use crate::entities::user::Role;
use crate::errors::ServiceError;
use crate::handlers::ApiJson;
use crate::services::courses::{CreateCourse, UpdateCourse};
use crate::{ApiResponse, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_courses).post(create_course))
        .route(
            "/:id",
            get(get_course).put(update_course).delete(delete_course),
        )
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 32))]
    pub code: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCourseRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
}

pub async fn create_course(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<CreateCourseRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require(Role::Supervisor)?;
    payload.validate()?;

    let created = state
        .courses
        .create_course(CreateCourse {
            name: payload.name,
            code: payload.code,
            address: payload.address,
            contact_phone: payload.contact_phone,
        })
        .await?;

    Ok((StatusCode::CREATED, ApiResponse::ok(created)))
}

pub async fn list_courses(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<golf_course::Model>>>, ServiceError> {
    Ok(ApiResponse::ok(state.courses.list_courses().await?))
}

pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<golf_course::Model>>, ServiceError> {
    Ok(ApiResponse::ok(state.courses.get_course(id).await?))
}

pub async fn update_course(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<UpdateCourseRequest>,
) -> Result<Json<ApiResponse<golf_course::Model>>, ServiceError> {
    user.require(Role::Supervisor)?;
    payload.validate()?;

    let updated = state
        .courses
        .update_course(
            id,
            UpdateCourse {
                name: payload.name,
                address: payload.address,
                contact_phone: payload.contact_phone,
            },
        )
        .await?;

    Ok(ApiResponse::ok(updated))
}

pub async fn delete_course(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse>, ServiceError> {
    user.require(Role::Admin)?;
    state.courses.delete_course(id).await?;
    Ok(ApiResponse::message("Course deleted"))
}
