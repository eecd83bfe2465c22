mod common;

use axum::http::{Method, StatusCode};

use common::{json_body, TestApp};

#[tokio::test]
async fn unconfigured_remote_serves_local_data() {
    let app = TestApp::new().await;

    let body = json_body(
        app.request_authenticated(Method::GET, "/api/v1/remote/jobs", None)
            .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(body["data"]["source"], "local");
    assert!(body["data"]["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_remote_falls_back_to_local_data() {
    // Nothing listens on the discard port; the connection fails fast.
    let app = TestApp::with_config(|cfg| {
        cfg.external_api_url = Some("http://127.0.0.1:9".to_string());
        cfg.external_api_timeout_secs = 1;
    })
    .await;

    let body = json_body(
        app.request_authenticated(Method::GET, "/api/v1/remote/vehicles", None)
            .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(body["data"]["source"], "local");
    assert!(app.state.metrics.counter("remote_fallbacks_total") >= 1);
}
