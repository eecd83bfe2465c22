mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use cartfleet_api::entities::user::Role;
use common::{json_body, TestApp};

#[tokio::test]
async fn login_issues_a_working_token() {
    let app = TestApp::new().await;

    json_body(
        app.request_authenticated(
            Method::POST,
            "/api/v1/users/register",
            Some(json!({
                "username": "mechanic1",
                "email": "mechanic1@example.com",
                "password": "wrench-and-oil",
                "role": "staff"
            })),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;

    let login = json_body(
        app.request(
            Method::POST,
            "/auth/login",
            Some(json!({ "username": "mechanic1", "password": "wrench-and-oil" })),
            None,
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(login["token_type"], "Bearer");
    assert!(login["user"].get("password_hash").is_none());

    let token = login["access_token"].as_str().unwrap();
    let me = json_body(
        app.request(Method::GET, "/api/v1/auth/me", None, Some(token))
            .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(me["data"]["username"], "mechanic1");
}

#[tokio::test]
async fn bad_credentials_are_rejected() {
    let app = TestApp::new().await;

    let body = json_body(
        app.request(
            Method::POST,
            "/auth/login",
            Some(json!({ "username": "admin", "password": "wrong" })),
            None,
        )
        .await,
        StatusCode::UNAUTHORIZED,
    )
    .await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn api_requires_a_bearer_token() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/parts", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request(Method::GET, "/api/v1/parts", None, Some("garbage-token"))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn staff_cannot_move_stock_or_register_users() {
    let app = TestApp::new().await;
    let staff = app.token_for("staffer", Role::Staff).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/stock/transfer",
            Some(json!({
                "part_id": uuid::Uuid::new_v4(),
                "from_location_id": "",
                "to_location_id": "",
                "quantity": 1
            })),
            Some(&staff),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .request(
            Method::POST,
            "/api/v1/users/register",
            Some(json!({
                "username": "intruder",
                "email": "intruder@example.com",
                "password": "password-123",
                "role": "admin"
            })),
            Some(&staff),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn central_role_can_move_stock_but_not_delete_parts() {
    let app = TestApp::new().await;
    let central = app.token_for("warehouse", Role::Central).await;

    // Seed a part as admin.
    let part = json_body(
        app.request_authenticated(
            Method::POST,
            "/api/v1/parts",
            Some(json!({ "part_number": "P9", "name": "Tire", "min_qty": 0, "max_qty": 10 })),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    let part_id = part["data"]["id"].as_str().unwrap().to_string();

    let body = json_body(
        app.request(
            Method::POST,
            "/api/v1/stock/in",
            Some(json!({ "part_id": part_id, "location_id": "", "quantity": 5 })),
            Some(&central),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(body["data"]["quantity"], 5);

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/parts/{}", part_id),
            None,
            Some(&central),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn health_and_metrics_are_public() {
    let app = TestApp::new().await;

    let health = json_body(
        app.request(Method::GET, "/health", None, None).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(health["status"], "ok");
    assert_eq!(health["database"], "up");

    // The health request above must already be visible in the counters.
    let metrics = json_body(
        app.request(Method::GET, "/metrics/json", None, None).await,
        StatusCode::OK,
    )
    .await;
    assert!(metrics["counters"]["http_requests_total"].as_u64().unwrap() >= 1);
}
