mod common;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

use common::{json_body, TestApp};

async fn seed_part_and_course(app: &TestApp) -> (Uuid, Uuid) {
    let course = json_body(
        app.request_authenticated(
            Method::POST,
            "/api/v1/courses",
            Some(json!({ "name": "Course A", "code": "courseA" })),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    let course_id: Uuid = course["data"]["id"].as_str().unwrap().parse().unwrap();

    let part = json_body(
        app.request_authenticated(
            Method::POST,
            "/api/v1/parts",
            Some(json!({
                "part_number": "P1",
                "name": "Drive belt",
                "min_qty": 1,
                "max_qty": 50
            })),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    let part_id: Uuid = part["data"]["id"].as_str().unwrap().parse().unwrap();

    // Central holds 10 to start.
    json_body(
        app.request_authenticated(
            Method::POST,
            "/api/v1/stock/in",
            Some(json!({ "part_id": part_id, "location_id": "", "quantity": 10 })),
        )
        .await,
        StatusCode::OK,
    )
    .await;

    (part_id, course_id)
}

async fn levels_by_location(app: &TestApp, part_id: Uuid) -> Vec<(Option<String>, i64)> {
    let body = json_body(
        app.request_authenticated(
            Method::GET,
            &format!("/api/v1/stock/levels?part_id={}", part_id),
            None,
        )
        .await,
        StatusCode::OK,
    )
    .await;

    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| {
            (
                row["location_id"].as_str().map(str::to_string),
                row["quantity"].as_i64().unwrap(),
            )
        })
        .collect()
}

fn quantity_at(levels: &[(Option<String>, i64)], location: Option<&str>) -> Option<i64> {
    levels
        .iter()
        .find(|(loc, _)| loc.as_deref() == location)
        .map(|(_, qty)| *qty)
}

#[tokio::test]
async fn transfer_moves_stock_and_appends_two_ledger_rows() {
    let app = TestApp::new().await;
    let (part_id, course_id) = seed_part_and_course(&app).await;
    let course = course_id.to_string();

    let body = json_body(
        app.request_authenticated(
            Method::POST,
            "/api/v1/stock/transfer",
            Some(json!({
                "part_id": part_id,
                "from_location_id": "",
                "to_location_id": course,
                "quantity": 4
            })),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Transfer successful");

    let levels = levels_by_location(&app, part_id).await;
    assert_eq!(quantity_at(&levels, None), Some(6));
    assert_eq!(quantity_at(&levels, Some(&course)), Some(4));

    // Legacy central aggregate mirrors the central row.
    let part = json_body(
        app.request_authenticated(Method::GET, &format!("/api/v1/parts/{}", part_id), None)
            .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(part["data"]["stock_qty"], 6);

    // Seed IN plus the transfer's OUT and IN.
    let ledger = json_body(
        app.request_authenticated(
            Method::GET,
            &format!("/api/v1/stock/transactions?part_id={}", part_id),
            None,
        )
        .await,
        StatusCode::OK,
    )
    .await;
    let rows = ledger["data"].as_array().unwrap();
    assert_eq!(rows.len(), 3);

    let transfer_rows: Vec<&Value> = rows
        .iter()
        .filter(|r| r["reference_type"] == "manual_transfer")
        .collect();
    assert_eq!(transfer_rows.len(), 2);

    let out_row = transfer_rows
        .iter()
        .find(|r| r["tx_type"] == "OUT")
        .expect("transfer OUT row");
    assert_eq!(out_row["previous_quantity"], 10);
    assert_eq!(out_row["new_quantity"], 6);
    assert!(out_row["location_id"].is_null());
    assert_eq!(out_row["destination_location_id"], course.as_str());

    let in_row = transfer_rows
        .iter()
        .find(|r| r["tx_type"] == "IN")
        .expect("transfer IN row");
    assert_eq!(in_row["previous_quantity"], 0);
    assert_eq!(in_row["new_quantity"], 4);
    assert_eq!(in_row["location_id"], course.as_str());
}

#[tokio::test]
async fn insufficient_stock_leaves_everything_unchanged() {
    let app = TestApp::new().await;
    let (part_id, course_id) = seed_part_and_course(&app).await;

    let body = json_body(
        app.request_authenticated(
            Method::POST,
            "/api/v1/stock/transfer",
            Some(json!({
                "part_id": part_id,
                "from_location_id": "",
                "to_location_id": course_id.to_string(),
                "quantity": 20
            })),
        )
        .await,
        StatusCode::BAD_REQUEST,
    )
    .await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Insufficient stock at source (Available: 10)");

    let levels = levels_by_location(&app, part_id).await;
    assert_eq!(quantity_at(&levels, None), Some(10));
    assert_eq!(levels.len(), 1);

    // Only the seeding IN row exists.
    let ledger = json_body(
        app.request_authenticated(
            Method::GET,
            &format!("/api/v1/stock/transactions?part_id={}", part_id),
            None,
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(ledger["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn non_positive_quantity_is_rejected() {
    let app = TestApp::new().await;
    let (part_id, course_id) = seed_part_and_course(&app).await;

    for quantity in [0, -3] {
        let body = json_body(
            app.request_authenticated(
                Method::POST,
                "/api/v1/stock/transfer",
                Some(json!({
                    "part_id": part_id,
                    "from_location_id": "",
                    "to_location_id": course_id.to_string(),
                    "quantity": quantity
                })),
            )
            .await,
            StatusCode::BAD_REQUEST,
        )
        .await;
        assert_eq!(body["message"], "Invalid Input");
    }

    let levels = levels_by_location(&app, part_id).await;
    assert_eq!(quantity_at(&levels, None), Some(10));
}

#[tokio::test]
async fn incomplete_body_keeps_the_error_envelope() {
    let app = TestApp::new().await;
    let (part_id, course_id) = seed_part_and_course(&app).await;

    // `quantity` omitted: the failure must stay a 400 JSON envelope, not
    // a plain-text deserialization rejection.
    let body = json_body(
        app.request_authenticated(
            Method::POST,
            "/api/v1/stock/transfer",
            Some(json!({
                "part_id": part_id,
                "from_location_id": "",
                "to_location_id": course_id.to_string()
            })),
        )
        .await,
        StatusCode::BAD_REQUEST,
    )
    .await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid Input");

    let levels = levels_by_location(&app, part_id).await;
    assert_eq!(quantity_at(&levels, None), Some(10));
}

#[tokio::test]
async fn same_location_transfer_is_rejected() {
    let app = TestApp::new().await;
    let (part_id, course_id) = seed_part_and_course(&app).await;
    let course = course_id.to_string();

    // Central to central and course to course both fail the same way.
    for (from, to) in [("", ""), (course.as_str(), course.as_str())] {
        let body = json_body(
            app.request_authenticated(
                Method::POST,
                "/api/v1/stock/transfer",
                Some(json!({
                    "part_id": part_id,
                    "from_location_id": from,
                    "to_location_id": to,
                    "quantity": 2
                })),
            )
            .await,
            StatusCode::BAD_REQUEST,
        )
        .await;
        assert_eq!(body["message"], "Source and Destination must be different");
    }
}

#[tokio::test]
async fn unknown_part_is_a_404() {
    let app = TestApp::new().await;
    let (_, course_id) = seed_part_and_course(&app).await;

    let body = json_body(
        app.request_authenticated(
            Method::POST,
            "/api/v1/stock/transfer",
            Some(json!({
                "part_id": Uuid::new_v4(),
                "from_location_id": "",
                "to_location_id": course_id.to_string(),
                "quantity": 1
            })),
        )
        .await,
        StatusCode::NOT_FOUND,
    )
    .await;
    assert_eq!(body["message"], "Part not found");
}

#[tokio::test]
async fn stock_out_guards_and_writes_ledger() {
    let app = TestApp::new().await;
    let (part_id, _) = seed_part_and_course(&app).await;

    let body = json_body(
        app.request_authenticated(
            Method::POST,
            "/api/v1/stock/out",
            Some(json!({ "part_id": part_id, "location_id": "", "quantity": 3 })),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(body["data"]["quantity"], 7);

    let part = json_body(
        app.request_authenticated(Method::GET, &format!("/api/v1/parts/{}", part_id), None)
            .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(part["data"]["stock_qty"], 7);

    let body = json_body(
        app.request_authenticated(
            Method::POST,
            "/api/v1/stock/out",
            Some(json!({ "part_id": part_id, "location_id": "", "quantity": 100 })),
        )
        .await,
        StatusCode::BAD_REQUEST,
    )
    .await;
    assert_eq!(body["message"], "Insufficient stock at source (Available: 7)");
}
