//! End-to-end tests of the HTTP API against the in-memory store

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{
        Method, Request, StatusCode,
        header::{ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS},
    },
};
use std::time::Duration;
use serde_json::{Value, json};
use tower::ServiceExt;

use video_api::{
    AppState, create_router,
    rate_limiter::{RateLimiter, RateLimiterConfig},
    repositories::MemoryVideoStore,
    routes::JSON_BODY_LIMIT,
    service::VideoService,
};

fn app() -> (Router, MemoryVideoStore) {
    let store = MemoryVideoStore::new();
    let state = AppState::new(VideoService::new(Arc::new(store.clone())));
    (create_router(state), store)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn video_payload(title: &str, rating: &str, release_date: &str) -> Value {
    json!({
        "videoLink": "youtube.com/embed/dQw4w9WgXcQ",
        "title": title,
        "genre": "Education",
        "contentRating": rating,
        "releaseDate": release_date,
        "previewImage": "https://i.ytimg.com/vi/dQw4w9WgXcQ/mqdefault.jpg",
    })
}

async fn create(app: &Router, title: &str, rating: &str, release_date: &str) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/v1/videos",
        Some(video_payload(title, rating, release_date)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    body["data"].clone()
}

fn titles(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["title"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    assert!(body["uptime"].is_number());
}

#[tokio::test]
async fn test_create_returns_stored_video() {
    let (app, store) = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/videos",
        Some(video_payload("Sample Video 1", "Anyone", "2023-01-15")),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Video created successfully");
    assert!(body["data"]["id"].is_string());
    assert_eq!(body["data"]["votes"], json!({"upVotes": 0, "downVotes": 0}));
    assert_eq!(body["data"]["viewCount"], 0);
    assert_eq!(body["data"]["totalVotes"], 0);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_create_rejects_bad_genre_and_future_date() {
    let (app, store) = app();

    let mut payload = video_payload("Tomorrow", "Anyone", "2999-01-01");
    payload["genre"] = json!("Horror");

    let (status, body) = send(&app, Method::POST, "/v1/videos", Some(payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("Genre must be one of"));
    assert!(message.contains("Release date cannot be in the future"));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_create_rejects_malformed_json() {
    let (app, store) = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/videos")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{\"title\": "))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_get_video_by_id() {
    let (app, _) = app();
    let created = create(&app, "Find me", "7+", "2022-02-02").await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = send(&app, Method::GET, &format!("/v1/videos/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Find me");
    assert_eq!(body["data"]["contentRating"], "7+");
}

#[tokio::test]
async fn test_missing_video_is_not_found() {
    let (app, _) = app();

    let (status, body) = send(
        &app,
        Method::GET,
        "/v1/videos/6f1c3c1e-8a7e-4d2b-9a53-0c6f0c1b7e11",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"success": false, "message": "Video not found"}));

    let (status, _) = send(&app, Method::GET, "/v1/videos/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::PATCH,
        "/v1/videos/6f1c3c1e-8a7e-4d2b-9a53-0c6f0c1b7e11/views",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_route() {
    let (app, _) = app();
    let (status, body) = send(&app, Method::GET, "/v2/everything", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"success": false, "message": "Route not found"}));
}

#[tokio::test]
async fn test_unsupported_methods_use_error_envelope() {
    let (app, _) = app();
    let created = create(&app, "Method check", "Anyone", "2023-01-15").await;
    let id = created["id"].as_str().unwrap();
    let not_found = json!({"success": false, "message": "Route not found"});

    let (status, body) = send(&app, Method::DELETE, &format!("/v1/videos/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, not_found);

    let (status, body) = send(&app, Method::PUT, "/v1/videos", Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, not_found);

    let (status, body) = send(&app, Method::GET, &format!("/v1/videos/{id}/views"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, not_found);

    let (_, body) = send(&app, Method::GET, &format!("/v1/videos/{id}"), None).await;
    assert_eq!(body["data"]["viewCount"], 0);
}

#[tokio::test]
async fn test_rate_limit_rejects_excess_requests() {
    let store = MemoryVideoStore::new();
    let limiter = RateLimiter::new(RateLimiterConfig {
        max_requests: 2,
        window: Duration::from_secs(60),
    });
    let app = create_router(
        AppState::new(VideoService::new(Arc::new(store))).with_rate_limiter(limiter),
    );

    for _ in 0..2 {
        let (status, _) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/v1/videos").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()["ratelimit-limit"], "2");
    assert_eq!(response.headers()["ratelimit-remaining"], "0");
    assert!(response.headers().contains_key("retry-after"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        body,
        json!({
            "success": false,
            "message": "Too many requests from this IP, please try again later."
        })
    );
}

#[tokio::test]
async fn test_security_headers_are_set() {
    let (app, _) = app();
    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(headers[X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
    assert!(
        headers["content-security-policy"]
            .to_str()
            .unwrap()
            .starts_with("default-src 'self'")
    );
}

#[tokio::test]
async fn test_responses_are_gzip_compressed_on_request() {
    let (app, _) = app();
    for i in 0..5 {
        create(&app, &format!("Compressible video {i}"), "Anyone", "2023-01-15").await;
    }

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/v1/videos")
                .header(ACCEPT_ENCODING, "gzip")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_ENCODING], "gzip");
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let (app, store) = app();
    let mut payload = video_payload("Huge", "Anyone", "2023-01-15");
    payload["title"] = json!("x".repeat(JSON_BODY_LIMIT + 1));

    let (status, body) = send(&app, Method::POST, "/v1/videos", Some(payload)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body, json!({"success": false, "message": "Request body too large"}));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_content_rating_filter_includes_stricter_ratings() {
    let (app, _) = app();
    create(&app, "Family", "Anyone", "2023-01-15").await;
    create(&app, "Teen", "16+", "2023-02-20").await;

    let (status, body) = send(&app, Method::GET, "/v1/videos?contentRating=12%2B", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&body), vec!["Teen"]);
    assert_eq!(body["pagination"]["total"], 1);

    let (_, body) = send(&app, Method::GET, "/v1/videos?contentRating=Anyone", None).await;
    assert_eq!(body["pagination"]["total"], 2);
}

#[tokio::test]
async fn test_second_page_of_two() {
    let (app, _) = app();
    create(&app, "Older", "Anyone", "2021-01-01").await;
    create(&app, "Newer", "Anyone", "2022-01-01").await;

    let (status, body) = send(&app, Method::GET, "/v1/videos?page=2&limit=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&body), vec!["Older"]);
    assert_eq!(
        body["pagination"],
        json!({"total": 2, "page": 2, "totalPages": 2, "hasMore": false})
    );

    let (_, body) = send(&app, Method::GET, "/v1/videos?page=1&limit=1", None).await;
    assert_eq!(titles(&body), vec!["Newer"]);
    assert_eq!(body["pagination"]["hasMore"], true);
}

#[tokio::test]
async fn test_title_genre_and_sort_filters() {
    let (app, _) = app();
    create(&app, "Rust for beginners", "Anyone", "2021-01-01").await;
    create(&app, "Advanced rust", "Anyone", "2022-01-01").await;
    create(&app, "Cooking pasta", "Anyone", "2023-01-01").await;

    let (_, body) = send(&app, Method::GET, "/v1/videos?title=%20RUST%20&sortBy=title", None).await;
    assert_eq!(titles(&body), vec!["Advanced rust", "Rust for beginners"]);

    let (_, body) = send(&app, Method::GET, "/v1/videos?genres=Sports,Comedy", None).await;
    assert_eq!(body["pagination"]["total"], 0);

    let (_, body) = send(&app, Method::GET, "/v1/videos?genres=All", None).await;
    assert_eq!(body["pagination"]["total"], 3);

    let (status, body) = send(&app, Method::GET, "/v1/videos?genres=Horror", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = send(&app, Method::GET, "/v1/videos?page=two", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_view_count_increments() {
    let (app, _) = app();
    let created = create(&app, "Watched", "Anyone", "2023-01-15").await;
    let id = created["id"].as_str().unwrap();
    let uri = format!("/v1/videos/{id}/views");

    for _ in 0..3 {
        let (status, body) = send(&app, Method::PATCH, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "View count updated successfully");
    }

    let (_, body) = send(&app, Method::GET, &format!("/v1/videos/{id}"), None).await;
    assert_eq!(body["data"]["viewCount"], 3);
}

#[tokio::test]
async fn test_votes() {
    let (app, _) = app();
    let created = create(&app, "Voted", "Anyone", "2023-01-15").await;
    let id = created["id"].as_str().unwrap();
    let uri = format!("/v1/videos/{id}/votes");

    let (status, body) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(json!({"vote": "upVote", "change": "increase"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["votes"]["upVotes"], 1);
    assert_eq!(body["data"]["voteRatio"], 100.0);

    let (status, body) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(json!({"vote": "sideways", "change": "increase"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Vote must be one of: upVote, downVote");
}

#[tokio::test]
async fn test_decrease_at_zero_is_rejected_and_unchanged() {
    let (app, _) = app();
    let created = create(&app, "Unloved", "Anyone", "2023-01-15").await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/v1/videos/{id}/votes"),
        Some(json!({"vote": "downVote", "change": "decrease"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cannot decrease downVotes below 0");

    let (_, body) = send(&app, Method::GET, &format!("/v1/videos/{id}"), None).await;
    assert_eq!(body["data"]["votes"]["downVotes"], 0);
}

#[tokio::test]
async fn test_concurrent_views_and_votes_are_not_lost() {
    let (app, _) = app();
    let created = create(&app, "Viral", "Anyone", "2023-01-15").await;
    let id = created["id"].as_str().unwrap().to_string();

    let mut handles = Vec::new();
    for _ in 0..50 {
        let app = app.clone();
        let id = id.clone();
        handles.push(tokio::spawn(async move {
            let (status, _) = send(&app, Method::PATCH, &format!("/v1/videos/{id}/views"), None).await;
            assert_eq!(status, StatusCode::OK);
            let (status, _) = send(
                &app,
                Method::PATCH,
                &format!("/v1/videos/{id}/votes"),
                Some(json!({"vote": "upVote", "change": "increase"})),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let (_, body) = send(&app, Method::GET, &format!("/v1/videos/{id}"), None).await;
    assert_eq!(body["data"]["viewCount"], 50);
    assert_eq!(body["data"]["votes"]["upVotes"], 50);
}
