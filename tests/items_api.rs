//! End-to-end tests of the items API over the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tower::ServiceExt;

use laundry_items::api::{create_router, AppState};
use laundry_items::config::CorsOrigins;
use laundry_items::store::{MemoryStore, MockConfig};

fn app_with(store: MemoryStore) -> Router {
    create_router(AppState::new(Arc::new(store)), &CorsOrigins::Any)
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn timestamp(value: &Value) -> OffsetDateTime {
    OffsetDateTime::parse(value.as_str().expect("timestamp string"), &Rfc3339).unwrap()
}

async fn create(app: &Router, body: Value) -> Value {
    let (status, item) = call(app, "POST", "/items", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {item}");
    item
}

#[tokio::test]
async fn create_fills_defaults() {
    let app = app_with(MemoryStore::new());

    let item = create(&app, json!({"customer_name": "Alice", "service_type": "Wash"})).await;

    assert_eq!(item["status"], "Menunggu");
    assert!(!item["id"].is_null());
    assert!(!item["created_at"].is_null());
    assert!(!item["updated_at"].is_null());
    assert!(!item["checkin_date"].is_null());
    assert_eq!(item["price"], Value::Null);
    assert_eq!(item["brand"], Value::Null);
}

#[tokio::test]
async fn create_canonicalizes_status() {
    let app = app_with(MemoryStore::new());

    let item = create(
        &app,
        json!({"customer_name": "Alice", "service_type": "Wash", "status": "selesai"}),
    )
    .await;

    assert_eq!(item["status"], "Selesai");
}

#[tokio::test]
async fn create_rejects_missing_fields_and_bad_status() {
    let app = app_with(MemoryStore::new());

    let (status, body) = call(&app, "POST", "/items", Some(json!({"service_type": "Wash"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "customer_name and service_type are required");

    let (status, body) = call(
        &app,
        "POST",
        "/items",
        Some(json!({"customer_name": "Alice", "service_type": "Wash", "status": "done"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Menunggu, Proses, Selesai, Batal"));
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests() {
    let app = app_with(MemoryStore::new());

    let (status, _) = call(&app, "POST", "/items", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        "POST",
        "/items",
        Some(json!({"customer_name": 12, "service_type": "Wash"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        "POST",
        "/items",
        Some(json!({
            "customer_name": "Alice",
            "service_type": "Wash",
            "checkin_date": "tomorrow"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_accepts_blank_and_form_dates() {
    let app = app_with(MemoryStore::new());

    let item = create(
        &app,
        json!({
            "customer_name": "Alice",
            "service_type": "Wash",
            "checkin_date": "",
            "promised_date": ""
        }),
    )
    .await;
    assert!(!item["checkin_date"].is_null());
    assert_eq!(item["promised_date"], Value::Null);

    let item = create(
        &app,
        json!({
            "customer_name": "Bob",
            "service_type": "Repaint",
            "checkin_date": "2024-05-01T09:30",
            "promised_date": "2024-05-03"
        }),
    )
    .await;
    assert_eq!(item["checkin_date"], "2024-05-01T09:30:00Z");
    assert_eq!(item["promised_date"], "2024-05-03T00:00:00Z");
}

#[tokio::test]
async fn out_of_range_price_is_a_bad_request() {
    let app = app_with(MemoryStore::new());

    let (status, body) = call(
        &app,
        "POST",
        "/items",
        Some(json!({"customer_name": "Alice", "service_type": "Wash", "price": 1e30})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "price is out of range");

    let item = create(&app, json!({"customer_name": "Alice", "service_type": "Wash"})).await;
    let uri = format!("/items/{}", item["id"]);
    let (status, _) = call(&app, "PATCH", &uri, Some(json!({"price": 1e30}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_filters_by_status_newest_first() {
    let app = app_with(MemoryStore::new());

    for (name, status) in [("a", "Proses"), ("b", "Menunggu"), ("c", "proses"), ("d", "Selesai")] {
        create(
            &app,
            json!({"customer_name": name, "service_type": "Wash", "status": status}),
        )
        .await;
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    let (status, body) = call(&app, "GET", "/items?status=Proses", None).await;
    assert_eq!(status, StatusCode::OK);

    let items = body.as_array().unwrap();
    let names: Vec<_> = items.iter().map(|i| i["customer_name"].as_str().unwrap()).collect();
    assert_eq!(names, ["c", "a"]);
    assert!(items.iter().all(|i| i["status"] == "Proses"));

    let (_, body) = call(&app, "GET", "/items", None).await;
    let created: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|i| timestamp(&i["created_at"]))
        .collect();
    assert_eq!(created.len(), 4);
    assert!(created.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn list_handles_empty_and_invalid_filters() {
    let app = app_with(MemoryStore::new());

    let (status, body) = call(&app, "GET", "/items", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, body) = call(&app, "GET", "/items?status=", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, _) = call(&app, "GET", "/items?status=archived", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_returns_item_or_404() {
    let app = app_with(MemoryStore::new());
    let item = create(&app, json!({"customer_name": "Alice", "service_type": "Wash"})).await;

    let (status, body) = call(&app, "GET", &format!("/items/{}", item["id"]), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, item);

    let (status, body) = call(&app, "GET", "/items/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "item 999 not found");
}

#[tokio::test]
async fn patch_price_only_refreshes_updated_at() {
    let app = app_with(MemoryStore::new());
    let item = create(
        &app,
        json!({"customer_name": "Alice", "service_type": "Wash", "note": "white sole"}),
    )
    .await;
    let uri = format!("/items/{}", item["id"]);

    tokio::time::sleep(Duration::from_millis(5)).await;
    let (status, updated) = call(&app, "PATCH", &uri, Some(json!({"price": 25000}))).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(updated["price"], 25000.0);
    assert!(timestamp(&updated["updated_at"]) > timestamp(&item["updated_at"]));
    for field in [
        "id",
        "customer_name",
        "brand",
        "size",
        "service_type",
        "status",
        "checkin_date",
        "promised_date",
        "note",
        "created_at",
    ] {
        assert_eq!(updated[field], item[field], "field {field} changed");
    }
}

#[tokio::test]
async fn patch_validates_and_ignores_immutable_fields() {
    let app = app_with(MemoryStore::new());
    let item = create(&app, json!({"customer_name": "Alice", "service_type": "Wash"})).await;
    let uri = format!("/items/{}", item["id"]);

    let (status, _) = call(&app, "PATCH", &uri, Some(json!({"status": "lost"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, updated) = call(
        &app,
        "PATCH",
        &uri,
        Some(json!({
            "status": "  BATAL ",
            "id": 500,
            "created_at": "2000-01-01T00:00:00Z",
            "updated_at": "2000-01-01T00:00:00Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "Batal");
    assert_eq!(updated["id"], item["id"]);
    assert_eq!(updated["created_at"], item["created_at"]);
    assert!(timestamp(&updated["updated_at"]) >= timestamp(&item["updated_at"]));

    let (status, _) = call(&app, "PATCH", "/items/999", Some(json!({"note": "x"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_returns_snapshot_then_404() {
    let app = app_with(MemoryStore::new());
    let item = create(
        &app,
        json!({"customer_name": "Alice", "service_type": "Repaint", "price": 120000}),
    )
    .await;
    let uri = format!("/items/{}", item["id"]);

    let (status, body) = call(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], true);
    assert_eq!(body["item"], item);

    let (status, _) = call(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn store_failures_become_500_with_message() {
    let app = app_with(MemoryStore::with_config(MockConfig {
        fail_with: Some("relation \"items\" does not exist".to_string()),
        ..Default::default()
    }));

    let (status, body) = call(
        &app,
        "POST",
        "/items",
        Some(json!({"customer_name": "Alice", "service_type": "Wash"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "relation \"items\" does not exist");

    let (status, _) = call(&app, "GET", "/items", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn head_probe_answers_empty_ok() {
    let app = app_with(MemoryStore::new());

    let (status, body) = call(&app, "HEAD", "/items/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);
}
