//! HTTP API tests against the router

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use engagement_meter::{
    api::create_router,
    config::TrackerSettings,
    services::MemorySink,
    state::AppState,
};
use serde_json::{json, Value};
use tower::ServiceExt;

fn router() -> Router {
    let state = AppState::new(
        TrackerSettings::default(),
        Arc::new(MemorySink::new()),
        20554,
        "127.0.0.1".to_string(),
    );
    create_router(Arc::new(state))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(body) => Body::from(body.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test(start_paused = true)]
async fn page_view_lifecycle() {
    let app = router();

    let (status, created) = send(
        &app,
        Method::POST,
        "/pageviews",
        Some(json!({
            "url": "https://example.com/story",
            "article": ["one two three", " four five"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["estimate"]["words"], 5);
    assert_eq!(created["estimate"]["text"], "1 min read");
    assert_eq!(created["active_timers"], 2);
    assert_eq!(created["state"]["scroll_tracker"], json!({"40": 0, "70": 0}));
    let id = created["id"].as_u64().unwrap();

    let (status, scrolled) = send(
        &app,
        Method::POST,
        &format!("/pageviews/{}/scroll", id),
        Some(json!({
            "scroll_top": 650.0,
            "viewport_height": 800.0,
            "article_height": 1800.0,
            "header_height": 200.0,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(scrolled["state"]["last_percent"], 73);
    assert_eq!(scrolled["state"]["second_scroll"], true);
    assert_eq!(scrolled["state"]["first_scroll"], false);

    let (status, fetched) = send(&app, Method::GET, &format!("/pageviews/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["state"]["scroll_tracker"], json!({"40": 0, "70": 1}));

    let (status, closed) = send(&app, Method::DELETE, &format!("/pageviews/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(closed["active_timers"], 0);

    let (status, _) = send(&app, Method::GET, &format!("/pageviews/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test(start_paused = true)]
async fn missing_article_reports_error_source() {
    let app = router();

    let (status, created) = send(
        &app,
        Method::POST,
        "/pageviews",
        Some(json!({ "url": "https://example.com/no-article" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["disabled"], true);
    assert_eq!(
        created["error_source"],
        "Engagement measurement (https://example.com/no-article)"
    );
    assert_eq!(created["state"], Value::Null);
}

#[tokio::test(start_paused = true)]
async fn missing_header_disables_page_view() {
    let app = router();
    let (_, created) = send(
        &app,
        Method::POST,
        "/pageviews",
        Some(json!({ "url": "https://example.com/x", "article": ["text"] })),
    )
    .await;
    let id = created["id"].as_u64().unwrap();

    let (status, scrolled) = send(
        &app,
        Method::POST,
        &format!("/pageviews/{}/scroll", id),
        Some(json!({
            "scroll_top": 0.0,
            "viewport_height": 800.0,
            "article_height": 1800.0,
            "header_height": null,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(scrolled["disabled"], true);
    assert_eq!(scrolled["active_timers"], 0);
    assert_eq!(scrolled["error_source"], "Engagement measurement (https://example.com/x)");
}

#[tokio::test(start_paused = true)]
async fn unknown_page_view_is_not_found() {
    let app = router();
    let (status, _) = send(
        &app,
        Method::POST,
        "/pageviews/77/scroll",
        Some(json!({
            "scroll_top": 0.0,
            "viewport_height": 1.0,
            "article_height": 1.0,
            "header_height": 0.0,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, "/pageviews/77", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn config_status_and_health() {
    let app = router();

    let (status, config) = send(&app, Method::GET, "/config", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        config,
        json!({
            "article_selector": "article",
            "header_selector": "header",
            "words_per_minute": 250,
            "milestones": { "medium": 40, "full": 70 },
        })
    );

    let (status, server) = send(&app, Method::GET, "/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(server["active_page_views"], 0);
    assert_eq!(server["port"], 20554);

    let (status, health) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "ok");
}
