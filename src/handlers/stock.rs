//! Stock movement endpoints: transfer between locations, direct receipt
//! and issue, balance and ledger queries.

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{AuthRouterExt, AuthUser};
use crate::entities::user::Role;
use crate::entities::{inventory_level, stock_transaction};
use crate::errors::{ErrorResponse, ServiceError};
use crate::handlers::{parse_location, ApiJson};
use crate::services::inventory::{StockMovement, TransferStock};
use crate::{ApiResponse, AppState};

const DEFAULT_LEDGER_LIMIT: u64 = 50;
const MAX_LEDGER_LIMIT: u64 = 500;

pub fn router() -> Router<AppState> {
    let write = Router::new()
        .route("/transfer", post(transfer_stock))
        .route("/in", post(stock_in))
        .route("/out", post(stock_out))
        .with_role(Role::Central);

    Router::new()
        .route("/levels", get(levels))
        .route("/transactions", get(transactions))
        .merge(write)
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TransferRequest {
    pub part_id: Uuid,
    /// Source location; empty or absent means the central site.
    #[serde(default)]
    pub from_location_id: Option<String>,
    /// Destination location; empty or absent means the central site.
    #[serde(default)]
    pub to_location_id: Option<String>,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct MovementRequest {
    pub part_id: Uuid,
    #[serde(default)]
    pub location_id: Option<String>,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct LevelsQuery {
    pub part_id: Option<Uuid>,
    pub location_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LedgerQuery {
    pub part_id: Option<Uuid>,
    pub limit: Option<u64>,
}

/// Move stock between two locations in one transaction.
#[utoipa::path(
    post,
    path = "/api/v1/stock/transfer",
    request_body = TransferRequest,
    responses(
        (status = 200, description = "Transfer applied"),
        (status = 400, description = "Invalid input or insufficient stock", body = ErrorResponse),
        (status = 404, description = "Part not found", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "stock"
)]
pub async fn transfer_stock(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<TransferRequest>,
) -> Result<Json<ApiResponse>, ServiceError> {
    payload.validate()?;

    let cmd = TransferStock {
        part_id: payload.part_id,
        from_location: parse_location(payload.from_location_id.as_deref())?,
        to_location: parse_location(payload.to_location_id.as_deref())?,
        quantity: payload.quantity,
        actor: user.user_id,
    };
    state.inventory.transfer_stock(cmd).await?;

    Ok(ApiResponse::message("Transfer successful"))
}

/// Receive stock into a location.
#[utoipa::path(
    post,
    path = "/api/v1/stock/in",
    request_body = MovementRequest,
    responses(
        (status = 200, description = "Stock received"),
        (status = 400, description = "Invalid input", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "stock"
)]
pub async fn stock_in(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<MovementRequest>,
) -> Result<Json<ApiResponse<inventory_level::Model>>, ServiceError> {
    payload.validate()?;

    let level = state
        .inventory
        .stock_in(StockMovement {
            part_id: payload.part_id,
            location: parse_location(payload.location_id.as_deref())?,
            quantity: payload.quantity,
            actor: user.user_id,
        })
        .await?;

    Ok(ApiResponse::ok(level))
}

/// Issue stock out of a location.
#[utoipa::path(
    post,
    path = "/api/v1/stock/out",
    request_body = MovementRequest,
    responses(
        (status = 200, description = "Stock issued"),
        (status = 400, description = "Invalid input or insufficient stock", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "stock"
)]
pub async fn stock_out(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<MovementRequest>,
) -> Result<Json<ApiResponse<inventory_level::Model>>, ServiceError> {
    payload.validate()?;

    let level = state
        .inventory
        .stock_out(StockMovement {
            part_id: payload.part_id,
            location: parse_location(payload.location_id.as_deref())?,
            quantity: payload.quantity,
            actor: user.user_id,
        })
        .await?;

    Ok(ApiResponse::ok(level))
}

/// List balance rows. `location_id=` (empty) selects the central site;
/// omitting the parameter applies no location filter.
pub async fn levels(
    State(state): State<AppState>,
    Query(query): Query<LevelsQuery>,
) -> Result<Json<ApiResponse<Vec<inventory_level::Model>>>, ServiceError> {
    let location = match query.location_id.as_deref() {
        None => None,
        Some(raw) => Some(parse_location(Some(raw))?),
    };

    let rows = state.inventory.levels(query.part_id, location).await?;
    Ok(ApiResponse::ok(rows))
}

/// Ledger entries, newest first.
pub async fn transactions(
    State(state): State<AppState>,
    Query(query): Query<LedgerQuery>,
) -> Result<Json<ApiResponse<Vec<stock_transaction::Model>>>, ServiceError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LEDGER_LIMIT)
        .min(MAX_LEDGER_LIMIT);

    let rows = state.inventory.transactions(query.part_id, limit).await?;
    Ok(ApiResponse::ok(rows))
}
