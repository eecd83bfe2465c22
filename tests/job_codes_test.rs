mod common;

use axum::http::{Method, StatusCode};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::json;
use uuid::Uuid;

use cartfleet_api::entities::job;
use cartfleet_api::services::jobs::JobService;
use common::{json_body, TestApp};

async fn seed_job(app: &TestApp) -> Uuid {
    let vehicle = json_body(
        app.request_authenticated(
            Method::POST,
            "/api/v1/vehicles",
            Some(json!({ "serial_number": format!("GC-{}", Uuid::new_v4()), "model": "E-Z-GO RXV" })),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    let vehicle_id = vehicle["data"]["id"].as_str().unwrap().to_string();

    let created = json_body(
        app.request_authenticated(
            Method::POST,
            "/api/v1/jobs",
            Some(json!({ "vehicle_id": vehicle_id, "description": "Brake adjustment" })),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    created["data"]["id"].as_str().unwrap().parse().unwrap()
}

async fn set_status(app: &TestApp, job_id: Uuid, status: &str) {
    json_body(
        app.request_authenticated(
            Method::PUT,
            &format!("/api/v1/jobs/{}/status", job_id),
            Some(json!({ "status": status })),
        )
        .await,
        StatusCode::OK,
    )
    .await;
}

#[tokio::test]
async fn requisition_requires_an_approved_job() {
    let app = TestApp::new().await;
    let job_id = seed_job(&app).await;

    // Still pending.
    let body = json_body(
        app.request_authenticated(
            Method::POST,
            "/api/v1/jobs/requisition",
            Some(json!({ "jobId": job_id })),
        )
        .await,
        StatusCode::BAD_REQUEST,
    )
    .await;
    assert_eq!(body["success"], false);

    let job = json_body(
        app.request_authenticated(Method::GET, &format!("/api/v1/jobs/{}", job_id), None)
            .await,
        StatusCode::OK,
    )
    .await;
    assert!(job["data"]["prr_number"].is_null());
}

#[tokio::test]
async fn requisition_is_idempotent_per_job() {
    let app = TestApp::new().await;
    let job_id = seed_job(&app).await;
    set_status(&app, job_id, "approved").await;

    let first = json_body(
        app.request_authenticated(
            Method::POST,
            "/api/v1/jobs/requisition",
            Some(json!({ "jobId": job_id })),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    let expected_prefix = format!("PRR-{}-", Utc::now().format("%y%m%d"));
    let prr = first["prrNumber"].as_str().unwrap().to_string();
    assert!(prr.starts_with(&expected_prefix), "got {}", prr);
    assert!(prr.ends_with("0001"));
    assert_eq!(first["message"], "Generated new requisition number");
    assert_eq!(first["jobId"], job_id.to_string());

    let second = json_body(
        app.request_authenticated(
            Method::POST,
            "/api/v1/jobs/requisition",
            Some(json!({ "jobId": job_id })),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(second["prrNumber"], prr);
    assert_eq!(second["message"], "Using existing requisition number");
}

#[tokio::test]
async fn requisition_numbers_count_up_within_a_day() {
    let app = TestApp::new().await;

    let first_job = seed_job(&app).await;
    set_status(&app, first_job, "approved").await;
    let second_job = seed_job(&app).await;
    set_status(&app, second_job, "approved").await;

    let first = json_body(
        app.request_authenticated(
            Method::POST,
            "/api/v1/jobs/requisition",
            Some(json!({ "jobId": first_job })),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    let second = json_body(
        app.request_authenticated(
            Method::POST,
            "/api/v1/jobs/requisition",
            Some(json!({ "jobId": second_job })),
        )
        .await,
        StatusCode::OK,
    )
    .await;

    assert!(first["prrNumber"].as_str().unwrap().ends_with("0001"));
    assert!(second["prrNumber"].as_str().unwrap().ends_with("0002"));
}

#[tokio::test]
async fn mwr_codes_increment_within_the_month() {
    let app = TestApp::new().await;
    let job_id = seed_job(&app).await;

    let prefix = format!("MWR-{}-", Utc::now().format("%y%m"));

    // Two completed jobs already carry this month's codes.
    for (n, code) in [(1, "001"), (2, "002")] {
        let now = Utc::now();
        let seeded = job::ActiveModel {
            id: Set(Uuid::new_v4()),
            vehicle_id: Set(Uuid::new_v4()),
            course_id: Set(None),
            description: Set(format!("Historic job {}", n)),
            priority: Set(None),
            status: Set("completed".to_string()),
            prr_number: Set(None),
            mwr_code: Set(Some(format!("{}{}", prefix, code))),
            assigned_to: Set(None),
            created_by: Set(Uuid::new_v4()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        seeded.insert(&*app.state.db).await.unwrap();
    }

    let next = JobService::next_mwr_code(&*app.state.db).await.unwrap();
    assert_eq!(next, format!("{}003", prefix));

    // Completing a job through the API assigns exactly that code.
    set_status(&app, job_id, "approved").await;
    set_status(&app, job_id, "in_progress").await;
    let completed = json_body(
        app.request_authenticated(
            Method::POST,
            &format!("/api/v1/jobs/{}/mwr", job_id),
            None,
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(completed["data"]["mwr_code"], format!("{}003", prefix));
    assert_eq!(completed["data"]["status"], "completed");
}

#[tokio::test]
async fn first_mwr_code_of_the_month_is_001() {
    let app = TestApp::new().await;
    let next = JobService::next_mwr_code(&*app.state.db).await.unwrap();
    assert_eq!(next, format!("MWR-{}-001", Utc::now().format("%y%m")));
}
