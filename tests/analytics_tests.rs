//! Analytics ingest and summary tests
//!
//! Serialized because they share the global test pool.

mod common;

use axum::http::{Method, StatusCode, header};
use common::{cleanup_test_db, insert_user, request, send, setup_test_db};
use serde_json::{Value, json};
use serial_test::serial;
use studio_portal_api::infrastructure::entities::Role;

fn page_view(path: &str) -> Value {
    json!({ "eventType": "PAGE_VIEW", "path": path, "sessionId": "s-1" })
}

async fn ingest(events: Vec<Value>) -> (StatusCode, Value) {
    send(request(
        Method::POST,
        "/api/analytics/events",
        None,
        Some(json!({ "events": events })),
    ))
    .await
}

#[tokio::test]
#[serial]
async fn test_ingest_and_summarize() {
    let pool = setup_test_db().await;
    let viewer = insert_user(&pool, Role::Viewer, "Vera").await;

    let (status, json) = ingest(vec![
        page_view("/"),
        page_view("/"),
        page_view("/work"),
        page_view("/"),
        json!({ "eventType": "SCROLL_DEPTH", "path": "/", "value": 40 }),
        json!({ "eventType": "SCROLL_DEPTH", "path": "/work", "value": 80 }),
        json!({ "eventType": "CTA_CLICK", "path": "/", "label": "contact" }),
    ])
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(json["accepted"], 7);

    let (status, json) = send(request(
        Method::GET,
        "/api/analytics/summary",
        Some((viewer, Role::Viewer)),
        None,
    ))
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["pageViews"], 4);
    assert_eq!(json["ctaClicks"], 1);
    assert_eq!(json["averageScrollDepth"], 60.0);
    assert_eq!(
        json["topPages"],
        json!([{ "path": "/", "views": 3 }, { "path": "/work", "views": 1 }])
    );

    let (_, json) = send(request(
        Method::GET,
        "/api/analytics/summary?to=2001-01-01",
        Some((viewer, Role::Viewer)),
        None,
    ))
    .await;
    assert_eq!(json["pageViews"], 0);
    assert!(json["averageScrollDepth"].is_null());

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_ingest_device_type_from_user_agent() {
    let pool = setup_test_db().await;

    let mut req = request(
        Method::POST,
        "/api/analytics/events",
        None,
        Some(json!({ "events": [page_view("/pricing")] })),
    );
    req.headers_mut().insert(
        header::USER_AGENT,
        "Mozilla/5.0 (iPad; CPU OS 17_0 like Mac OS X)".parse().unwrap(),
    );
    let (status, _) = send(req).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (device_type,): (Option<String>,) =
        sqlx::query_as("SELECT device_type FROM analytics_events WHERE path = '/pricing'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(device_type.as_deref(), Some("tablet"));

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_ingest_validation() {
    let pool = setup_test_db().await;

    let (status, _) = ingest(vec![]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ingest((0..51).map(|i| page_view(&format!("/p/{i}"))).collect()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = ingest(vec![
        page_view("/"),
        json!({ "eventType": "SCROLL_DEPTH", "path": "/", "value": 101 }),
    ])
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["details"][0]["field"], "events[1].value");

    let (status, _) = ingest(vec![json!({ "eventType": "HOVER", "path": "/" })]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Rejected batches store nothing
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM analytics_events")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);

    let (status, _) = ingest((0..50).map(|i| page_view(&format!("/p/{i}"))).collect()).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_summary_is_staff_only() {
    let pool = setup_test_db().await;
    let client = insert_user(&pool, Role::Client, "Cleo").await;

    let (status, _) = send(request(Method::GET, "/api/analytics/summary", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(request(
        Method::GET,
        "/api/analytics/summary",
        Some((client, Role::Client)),
        None,
    ))
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    cleanup_test_db();
}
