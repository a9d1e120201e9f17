//! API service routes

use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, patch},
};
use chrono::Utc;
use serde_json::json;
use tower_http::compression::CompressionLayer;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    middleware::{log_requests, rate_limit, security_headers},
    models::{ApiResponse, NewVideoPayload, VideoResponse, VoteRequest},
    query::{VideoQueryParams, VideoSearch},
    state::AppState,
};

/// Largest accepted JSON request body
pub const JSON_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let video_routes = Router::new()
        .route(
            "/videos",
            get(get_videos).post(create_video).fallback(route_not_found),
        )
        .route("/videos/:id", get(get_video).fallback(route_not_found))
        .route(
            "/videos/:id/votes",
            patch(update_votes).fallback(route_not_found),
        )
        .route(
            "/videos/:id/views",
            patch(update_views).fallback(route_not_found),
        );

    let router = Router::new()
        .route("/health", get(health_check).fallback(route_not_found))
        .nest("/v1", video_routes)
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(JSON_BODY_LIMIT))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit));

    security_headers()
        .into_iter()
        .fold(router, |router, layer| router.layer(layer))
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

/// Ids that are not UUIDs cannot name a stored video
fn parse_video_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound("Video not found".to_string()))
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "OK",
        "service": "video-api",
        "timestamp": Utc::now().to_rfc3339(),
        "uptime": state.started_at.elapsed().as_secs_f64(),
    }))
}

/// Get videos with filtering, sorting, and pagination
pub async fn get_videos(
    State(state): State<AppState>,
    query: Result<Query<VideoQueryParams>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(params) = query?;
    let search = VideoSearch::try_from(params)?;
    info!(?search, "GET /v1/videos");

    let page = state.video_service.search(&search).await?;
    let videos: Vec<VideoResponse> = page.videos.into_iter().map(VideoResponse::from).collect();

    Ok(Json(ApiResponse::paginated(videos, page.pagination)))
}

/// Get a video by ID
pub async fn get_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_video_id(&id)?;
    let video = state.video_service.get(id).await?;

    Ok(Json(ApiResponse::data(VideoResponse::from(video))))
}

/// Create a new video
pub async fn create_video(
    State(state): State<AppState>,
    payload: Result<Json<NewVideoPayload>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload?;
    let video = state.video_service.create(&payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Video created successfully",
            VideoResponse::from(video),
        )),
    ))
}

/// Update video votes
pub async fn update_votes(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<VoteRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_video_id(&id)?;
    let Json(request) = payload?;
    let video = state.video_service.update_votes(id, &request).await?;

    Ok(Json(ApiResponse::with_message(
        "Vote updated successfully",
        VideoResponse::from(video),
    )))
}

/// Update video view count
pub async fn update_views(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_video_id(&id)?;
    let video = state.video_service.record_view(id).await?;

    Ok(Json(ApiResponse::with_message(
        "View count updated successfully",
        VideoResponse::from(video),
    )))
}

/// Fallback for unmatched routes
pub async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}
