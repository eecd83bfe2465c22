use axum::{
    extract::{Path, State},
    routing::{delete, get, put},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::entities::notification;
use crate::errors::ServiceError;
use crate::{ApiResponse, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/:id", delete(delete_notification))
        .route("/:id/read", put(mark_read))
        .route("/:id/unread", put(mark_unread))
}

/// The authenticated user's notifications, newest first.
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<Vec<notification::Model>>>, ServiceError> {
    Ok(ApiResponse::ok(
        state.notifications.list_for_user(user.user_id).await?,
    ))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<notification::Model>>, ServiceError> {
    Ok(ApiResponse::ok(
        state.notifications.set_read(id, user.user_id, true).await?,
    ))
}

pub async fn mark_unread(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<notification::Model>>, ServiceError> {
    Ok(ApiResponse::ok(
        state
            .notifications
            .set_read(id, user.user_id, false)
            .await?,
    ))
}

pub async fn delete_notification(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse>, ServiceError> {
    state.notifications.delete(id, user.user_id).await?;
    Ok(ApiResponse::message("Notification deleted"))
}
