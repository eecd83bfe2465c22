use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthUser;
use crate::entities::user::Role;
use crate::entities::vehicle::VehicleStatus;
use crate::entities::{serial_history, vehicle};
use crate::errors::ServiceError;
use crate::handlers::{parse_location, ApiJson};
use crate::services::vehicles::{CreateVehicle, UpdateVehicle};
use crate::{ApiResponse, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vehicles).post(create_vehicle))
        .route(
            "/:id",
            get(get_vehicle).put(update_vehicle).delete(delete_vehicle),
        )
        .route("/:id/transfer", post(transfer_vehicle))
        .route("/:id/history", get(vehicle_history))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateVehicleRequest {
    #[validate(length(min = 1, max = 64))]
    pub serial_number: String,
    #[validate(length(min = 1, max = 100))]
    pub model: String,
    /// Home course; empty or absent means the central depot.
    #[serde(default)]
    pub course_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateVehicleRequest {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TransferVehicleRequest {
    /// Destination course; empty or absent means the central depot.
    #[serde(default)]
    pub course_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VehiclesQuery {
    pub course_id: Option<Uuid>,
}

pub async fn create_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<CreateVehicleRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require(Role::Supervisor)?;
    payload.validate()?;

    let created = state
        .vehicles
        .create_vehicle(CreateVehicle {
            serial_number: payload.serial_number,
            model: payload.model,
            course_id: parse_location(payload.course_id.as_deref())?,
        })
        .await?;

    Ok((StatusCode::CREATED, ApiResponse::ok(created)))
}

pub async fn list_vehicles(
    State(state): State<AppState>,
    Query(query): Query<VehiclesQuery>,
) -> Result<Json<ApiResponse<Vec<vehicle::Model>>>, ServiceError> {
    Ok(ApiResponse::ok(
        state.vehicles.list_vehicles(query.course_id).await?,
    ))
}

pub async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<vehicle::Model>>, ServiceError> {
    Ok(ApiResponse::ok(state.vehicles.get_vehicle(id).await?))
}

pub async fn update_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<UpdateVehicleRequest>,
) -> Result<Json<ApiResponse<vehicle::Model>>, ServiceError> {
    user.require(Role::Supervisor)?;
    payload.validate()?;

    let status = match payload.status.as_deref() {
        Some(raw) => Some(VehicleStatus::parse(raw).ok_or_else(|| {
            ServiceError::InvalidInput(format!("Unknown vehicle status '{}'", raw))
        })?),
        None => None,
    };

    let updated = state
        .vehicles
        .update_vehicle(
            id,
            UpdateVehicle {
                model: payload.model,
                status,
            },
            user.user_id,
        )
        .await?;

    Ok(ApiResponse::ok(updated))
}

/// Move a vehicle to another course, or back to the central depot.
pub async fn transfer_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<TransferVehicleRequest>,
) -> Result<Json<ApiResponse<vehicle::Model>>, ServiceError> {
    user.require(Role::Supervisor)?;

    let to_course = parse_location(payload.course_id.as_deref())?;
    let updated = state
        .vehicles
        .transfer_vehicle(id, to_course, user.user_id)
        .await?;

    Ok(ApiResponse::ok(updated))
}

pub async fn delete_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse>, ServiceError> {
    user.require(Role::Admin)?;
    state.vehicles.delete_vehicle(id, user.user_id).await?;
    Ok(ApiResponse::message("Vehicle deleted"))
}

/// Event trail for the vehicle's serial number, oldest first.
pub async fn vehicle_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<serial_history::Model>>>, ServiceError> {
    let found = state.vehicles.get_vehicle(id).await?;
    Ok(ApiResponse::ok(
        state.vehicles.serial_history(&found.serial_number).await?,
    ))
}
