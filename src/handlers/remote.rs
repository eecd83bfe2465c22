//! Read-only proxy for the remote maintenance API.
//!
//! When the remote side is unconfigured, times out, refuses connections,
//! or answers 5xx, the handlers serve local data instead and tag the
//! response `"source": "local"`. Remote 4xx surface as errors.

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use tracing::warn;

use crate::errors::ServiceError;
use crate::proxy::ProxyError;
use crate::services::jobs::JobFilter;
use crate::{ApiResponse, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/jobs", get(remote_jobs))
        .route("/vehicles", get(remote_vehicles))
}

pub async fn remote_jobs(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, ServiceError> {
    match fetch_remote(&state, "jobs").await? {
        Some(data) => Ok(ApiResponse::ok(json!({ "source": "remote", "items": data }))),
        None => {
            let local = state.jobs.list_jobs(JobFilter::default()).await?;
            Ok(ApiResponse::ok(
                json!({ "source": "local", "items": local }),
            ))
        }
    }
}

pub async fn remote_vehicles(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, ServiceError> {
    match fetch_remote(&state, "vehicles").await? {
        Some(data) => Ok(ApiResponse::ok(json!({ "source": "remote", "items": data }))),
        None => {
            let local = state.vehicles.list_vehicles(None).await?;
            Ok(ApiResponse::ok(
                json!({ "source": "local", "items": local }),
            ))
        }
    }
}

/// `Ok(Some(_))` on remote success, `Ok(None)` when local fallback should
/// serve, `Err` for remote errors that must surface.
async fn fetch_remote(state: &AppState, path: &str) -> Result<Option<Value>, ServiceError> {
    let Some(client) = &state.remote else {
        return Ok(None);
    };

    match client.get_json(path).await {
        Ok(data) => Ok(Some(data)),
        Err(err) if err.is_fallback() => {
            warn!(path = path, error = %err, "remote API unavailable, serving local data");
            state.metrics.increment("remote_fallbacks_total");
            Ok(None)
        }
        Err(err) => Err(ServiceError::ExternalApiError(err.to_string())),
    }
}
