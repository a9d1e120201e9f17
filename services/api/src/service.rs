//! Video service: listing, lookup, creation and counter updates
//!
//! Store faults are logged here and surfaced as internal errors with a
//! fixed message; bad input and missing videos keep their specific message.

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{NewVideoPayload, Video, VoteChange, VoteKind, VoteRequest},
    query::{Pagination, VideoSearch},
    repositories::{CounterUpdate, SharedVideoStore},
    validation::validate_new_video,
};

const VIDEO_NOT_FOUND: &str = "Video not found";

/// One page of a video listing
#[derive(Debug, Clone)]
pub struct VideoPage {
    pub videos: Vec<Video>,
    pub pagination: Pagination,
}

/// Video operations on top of a [`SharedVideoStore`]
#[derive(Clone)]
pub struct VideoService {
    store: SharedVideoStore,
}

impl VideoService {
    pub fn new(store: SharedVideoStore) -> Self {
        Self { store }
    }

    /// Fetch the requested page and the total match count
    pub async fn search(&self, search: &VideoSearch) -> ApiResult<VideoPage> {
        let (videos, total) = tokio::try_join!(
            self.store.find(&search.filter, search.sort, search.window),
            self.store.count(&search.filter),
        )
        .map_err(|e| {
            error!("Failed to search videos: {}", e);
            ApiError::InternalServerError("Error searching videos".to_string())
        })?;

        let pagination = Pagination::new(search.window, total, videos.len());
        Ok(VideoPage { videos, pagination })
    }

    /// Get a video by ID
    pub async fn get(&self, id: Uuid) -> ApiResult<Video> {
        self.store
            .find_by_id(id)
            .await
            .map_err(|e| {
                error!("Failed to get video {}: {}", id, e);
                ApiError::InternalServerError("Error fetching video".to_string())
            })?
            .ok_or_else(|| ApiError::NotFound(VIDEO_NOT_FOUND.to_string()))
    }

    /// Validate and store a new video
    pub async fn create(&self, payload: &NewVideoPayload) -> ApiResult<Video> {
        let new_video = validate_new_video(payload, Utc::now()).map_err(|errors| {
            warn!("Rejected video payload: {}", errors.join(", "));
            ApiError::BadRequest(errors.join(", "))
        })?;

        let video = self.store.insert(&new_video).await.map_err(|e| {
            error!("Failed to create video: {}", e);
            ApiError::InternalServerError("Error creating video".to_string())
        })?;

        info!("Created video {} ({})", video.id, video.title);
        Ok(video)
    }

    /// Apply an up/down vote change to a video
    pub async fn update_votes(&self, id: Uuid, request: &VoteRequest) -> ApiResult<Video> {
        let kind: VoteKind = request
            .vote
            .as_deref()
            .unwrap_or_default()
            .parse()
            .map_err(|_| ApiError::BadRequest("Vote must be one of: upVote, downVote".to_string()))?;
        let change: VoteChange = request
            .change
            .as_deref()
            .unwrap_or_default()
            .parse()
            .map_err(|_| {
                ApiError::BadRequest("Change must be one of: increase, decrease".to_string())
            })?;

        let outcome = self
            .store
            .adjust_votes(id, kind, change.delta())
            .await
            .map_err(|e| {
                error!("Failed to update votes of video {}: {}", id, e);
                ApiError::InternalServerError("Error updating votes".to_string())
            })?;

        match outcome {
            CounterUpdate::Updated(video) => Ok(video),
            CounterUpdate::NotFound => Err(ApiError::NotFound(VIDEO_NOT_FOUND.to_string())),
            CounterUpdate::Underflow => {
                warn!("Rejected {} decrease below 0 on video {}", kind.counter_name(), id);
                Err(ApiError::BadRequest(format!(
                    "Cannot decrease {} below 0",
                    kind.counter_name()
                )))
            }
        }
    }

    /// Count one more view of a video
    pub async fn record_view(&self, id: Uuid) -> ApiResult<Video> {
        self.store
            .increment_views(id)
            .await
            .map_err(|e| {
                error!("Failed to update view count of video {}: {}", id, e);
                ApiError::InternalServerError("Error updating view count".to_string())
            })?
            .ok_or_else(|| ApiError::NotFound(VIDEO_NOT_FOUND.to_string()))
    }
}
