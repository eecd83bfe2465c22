/*!
 * Fleet-maintenance backend for golf-cart operations.
 *
 * Users with ranked roles, golf courses, vehicles, maintenance jobs,
 * multi-location spare-parts stock with an append-only ledger, and
 * notifications, served over axum on SeaORM.
 */

use axum::{
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod metrics;
pub mod openapi;
pub mod proxy;
pub mod services;

use auth::{AuthConfig, AuthService};
use config::AppConfig;
use errors::ServiceError;
use metrics::MetricsRegistry;
use proxy::RemoteApiClient;
use services::{
    courses::CourseService, inventory::InventoryService, jobs::JobService,
    notifications::NotificationService, parts::PartService, vehicles::VehicleService,
};

/// Success envelope; failures use [`errors::ErrorResponse`].
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize = serde_json::Value> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: None,
            data: Some(data),
        })
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        })
    }
}

impl ApiResponse<serde_json::Value> {
    pub fn message(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: Some(message.into()),
            data: None,
        })
    }
}

/// Shared application state: the pooled connection, configuration, and the
/// service layer built on top of both.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub auth: Arc<AuthService>,
    pub metrics: Arc<MetricsRegistry>,
    pub remote: Option<Arc<RemoteApiClient>>,
    pub inventory: InventoryService,
    pub jobs: JobService,
    pub parts: PartService,
    pub courses: CourseService,
    pub vehicles: VehicleService,
    pub notifications: NotificationService,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Result<Self, ServiceError> {
        let db = Arc::new(db);
        let config = Arc::new(config);

        let auth = Arc::new(AuthService::new(
            AuthConfig::new(
                config.jwt_secret.clone(),
                Duration::from_secs(config.jwt_expiration as u64),
            ),
            db.clone(),
        ));

        let remote = match &config.external_api_url {
            Some(url) => Some(Arc::new(
                RemoteApiClient::new(
                    url,
                    Some(Duration::from_secs(config.external_api_timeout_secs)),
                )
                .map_err(|e| ServiceError::ExternalApiError(e.to_string()))?,
            )),
            None => None,
        };

        Ok(Self {
            auth,
            metrics: Arc::new(MetricsRegistry::new()),
            remote,
            inventory: InventoryService::new(db.clone()),
            jobs: JobService::new(db.clone()),
            parts: PartService::new(db.clone()),
            courses: CourseService::new(db.clone()),
            vehicles: VehicleService::new(db.clone()),
            notifications: NotificationService::new(db.clone()),
            db,
            config,
        })
    }
}

/// Build the full application router: public auth/diagnostic routes plus
/// the authenticated `/api/v1` surface.
pub fn app_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/stock", handlers::stock::router())
        .nest("/jobs", handlers::jobs::router())
        .nest("/parts", handlers::parts::router())
        .nest("/courses", handlers::courses::router())
        .nest("/vehicles", handlers::vehicles::router())
        .nest("/users", handlers::users::router())
        .nest("/notifications", handlers::notifications::router())
        .nest("/remote", handlers::remote::router())
        .route("/auth/me", get(handlers::users::me))
        .layer(middleware::from_fn(auth::auth_middleware));

    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/metrics/json", get(handlers::health::metrics_json))
        .route("/auth/login", post(handlers::users::login))
        .nest("/api/v1", api)
        .merge(
            SwaggerUi::new("/docs")
                .url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        )
        .layer(middleware::from_fn(metrics::track_metrics))
        .layer(Extension(state.auth.clone()))
        .layer(Extension(state.metrics.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    match &config.cors_allowed_origins {
        Some(origins) => {
            let parsed: Vec<axum::http::HeaderValue> = origins
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(parsed))
                .allow_methods(Any)
                .allow_headers(Any)
        }
        None if config.is_development() => CorsLayer::permissive(),
        None => CorsLayer::new(),
    }
}
