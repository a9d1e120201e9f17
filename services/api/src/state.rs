//! Application state shared across handlers

use std::time::Instant;

use crate::{rate_limiter::RateLimiter, service::VideoService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub video_service: VideoService,
    /// Absent when rate limiting is disabled
    pub rate_limiter: Option<RateLimiter>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(video_service: VideoService) -> Self {
        Self {
            video_service,
            rate_limiter: None,
            started_at: Instant::now(),
        }
    }

    pub fn with_rate_limiter(mut self, rate_limiter: RateLimiter) -> Self {
        self.rate_limiter = Some(rate_limiter);
        self
    }
}
