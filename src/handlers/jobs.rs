//! Maintenance-job endpoints: CRUD, lifecycle, requisition and work-report
//! codes, parts consumption.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthUser;
use crate::entities::job::JobStatus;
use crate::entities::user::Role;
use crate::entities::{job, parts_usage_log};
use crate::errors::{ErrorResponse, ServiceError};
use crate::handlers::ApiJson;
use crate::services::jobs::{CreateJob, JobFilter, UpdateJob};
use crate::{ApiResponse, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_jobs).post(create_job))
        .route("/requisition", post(generate_requisition))
        .route("/:id", get(get_job).put(update_job).delete(delete_job))
        .route("/:id/status", put(update_status))
        .route("/:id/mwr", post(assign_mwr))
        .route("/:id/parts", get(parts_usage).post(record_parts_usage))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateJobRequest {
    pub vehicle_id: Uuid,
    #[validate(length(min = 1, max = 2000))]
    pub description: String,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateJobRequest {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RequisitionRequest {
    #[serde(rename = "jobId")]
    pub job_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequisitionResponse {
    pub success: bool,
    pub prr_number: String,
    pub job_id: Uuid,
    pub message: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PartsUsageRequest {
    pub part_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct JobsQuery {
    pub status: Option<String>,
    pub vehicle_id: Option<Uuid>,
    pub course_id: Option<Uuid>,
}

pub async fn create_job(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<CreateJobRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;

    let created = state
        .jobs
        .create_job(CreateJob {
            vehicle_id: payload.vehicle_id,
            description: payload.description,
            priority: payload.priority,
            assigned_to: payload.assigned_to,
            created_by: user.user_id,
        })
        .await?;

    Ok((StatusCode::CREATED, ApiResponse::ok(created)))
}

pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobsQuery>,
) -> Result<Json<ApiResponse<Vec<job::Model>>>, ServiceError> {
    let status = match query.status.as_deref() {
        Some(raw) => Some(JobStatus::parse(raw).ok_or_else(|| {
            ServiceError::InvalidInput(format!("Unknown status '{}'", raw))
        })?),
        None => None,
    };

    let jobs = state
        .jobs
        .list_jobs(JobFilter {
            status,
            vehicle_id: query.vehicle_id,
            course_id: query.course_id,
        })
        .await?;

    Ok(ApiResponse::ok(jobs))
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<job::Model>>, ServiceError> {
    Ok(ApiResponse::ok(state.jobs.get_job(id).await?))
}

pub async fn update_job(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<UpdateJobRequest>,
) -> Result<Json<ApiResponse<job::Model>>, ServiceError> {
    user.require(Role::Supervisor)?;
    payload.validate()?;

    let updated = state
        .jobs
        .update_job(
            id,
            UpdateJob {
                description: payload.description,
                priority: payload.priority,
                assigned_to: payload.assigned_to.map(Some),
            },
        )
        .await?;

    Ok(ApiResponse::ok(updated))
}

pub async fn delete_job(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse>, ServiceError> {
    user.require(Role::Admin)?;
    state.jobs.delete_job(id).await?;
    Ok(ApiResponse::message("Job deleted"))
}

/// Lifecycle transition; completion assigns the monthly work-report code.
pub async fn update_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<StatusRequest>,
) -> Result<Json<ApiResponse<job::Model>>, ServiceError> {
    user.require(Role::Supervisor)?;

    let status = JobStatus::parse(&payload.status).ok_or_else(|| {
        ServiceError::InvalidStatus(format!("Unknown status '{}'", payload.status))
    })?;

    let updated = state.jobs.update_status(id, status, user.user_id).await?;
    Ok(ApiResponse::ok(updated))
}

/// Issue or return the requisition number for an approved job.
#[utoipa::path(
    post,
    path = "/api/v1/jobs/requisition",
    request_body = RequisitionRequest,
    responses(
        (status = 200, description = "Requisition number issued or returned", body = RequisitionResponse),
        (status = 400, description = "Job is not approved", body = ErrorResponse),
        (status = 404, description = "Job not found", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "jobs"
)]
pub async fn generate_requisition(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<RequisitionRequest>,
) -> Result<Json<RequisitionResponse>, ServiceError> {
    user.require(Role::Central)?;

    let outcome = state.jobs.generate_requisition_number(payload.job_id).await?;
    Ok(Json(RequisitionResponse {
        success: true,
        prr_number: outcome.prr_number,
        job_id: outcome.job_id,
        message: outcome.message.to_string(),
    }))
}

/// Complete the job and assign its work-report code.
pub async fn assign_mwr(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<job::Model>>, ServiceError> {
    user.require(Role::Supervisor)?;

    let updated = state
        .jobs
        .update_status(id, JobStatus::Completed, user.user_id)
        .await?;
    Ok(ApiResponse::ok(updated))
}

pub async fn record_parts_usage(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<PartsUsageRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;

    let logged = state
        .jobs
        .record_parts_usage(id, payload.part_id, payload.quantity, user.user_id)
        .await?;

    Ok((StatusCode::CREATED, ApiResponse::ok(logged)))
}

pub async fn parts_usage(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<parts_usage_log::Model>>>, ServiceError> {
    Ok(ApiResponse::ok(state.jobs.parts_usage(id).await?))
}
