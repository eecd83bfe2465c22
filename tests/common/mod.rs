use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use cartfleet_api::{
    app_router,
    config::AppConfig,
    db,
    entities::user::Role,
    AppState,
};

/// Test application backed by a throwaway SQLite database, exercising the
/// full router stack (auth middleware, role gates, metrics).
pub struct TestApp {
    router: Router,
    pub state: AppState,
    admin_token: String,
    _tmp: tempfile::TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Construct a test application, letting the caller adjust the
    /// configuration before the state is built.
    pub async fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let db_path = tmp.path().join("cartfleet_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "test_secret_key_for_testing_purposes_only_32chars".to_string(),
            3600,
            "127.0.0.1".to_string(),
            0,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        adjust(&mut cfg);

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::ensure_schema(&pool)
            .await
            .expect("failed to create test schema");

        let state = AppState::new(pool, cfg).expect("failed to build test state");

        let admin = state
            .auth
            .create_user("admin", "admin@example.com", "admin-password", Role::Admin)
            .await
            .expect("create admin user");
        let admin_token = state
            .auth
            .generate_token(&admin)
            .expect("admin token")
            .access_token;

        let router = app_router(state.clone());

        Self {
            router,
            state,
            admin_token,
            _tmp: tmp,
        }
    }

    /// Bearer token for the seeded admin user.
    pub fn token(&self) -> &str {
        &self.admin_token
    }

    /// Create a user with the given role and return a token for them.
    #[allow(dead_code)]
    pub async fn token_for(&self, username: &str, role: Role) -> String {
        let account = self
            .state
            .auth
            .create_user(
                username,
                &format!("{}@example.com", username),
                "password-123",
                role,
            )
            .await
            .expect("create role user");
        self.state
            .auth
            .generate_token(&account)
            .expect("role token")
            .access_token
    }

    /// Send a request with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&json).expect("serialize request body"))
            }
            None => Body::empty(),
        };

        let request = builder.body(body).expect("build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Convenience helper for admin-authenticated JSON requests.
    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response {
        self.request(method, uri, body, Some(&self.admin_token))
            .await
    }
}

/// Read a response body as JSON, asserting the expected status first.
pub async fn json_body(response: Response, expected: StatusCode) -> Value {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    assert_eq!(
        status,
        expected,
        "unexpected status, body: {}",
        String::from_utf8_lossy(&bytes)
    );
    serde_json::from_slice(&bytes).expect("response body is not JSON")
}
