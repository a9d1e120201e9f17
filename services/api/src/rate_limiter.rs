//! Per-client request rate limiter

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::sync::Mutex;
use tracing::warn;

/// Rate limiter configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// Maximum number of requests per window
    pub max_requests: u32,
    /// Window length
    pub window: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(15 * 60),
        }
    }
}

/// Outcome of one request against the limiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Time until the current window closes
    pub reset_after: Duration,
}

#[derive(Debug)]
struct WindowEntry {
    requests: u32,
    window_start: Instant,
}

/// Fixed-window limiter keyed by client address
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    entries: Arc<Mutex<HashMap<String, WindowEntry>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Count one request for `key` and decide whether it may proceed
    pub async fn check(&self, key: &str) -> RateLimitDecision {
        self.check_at(key, Instant::now()).await
    }

    async fn check_at(&self, key: &str, now: Instant) -> RateLimitDecision {
        let window = self.config.window;
        let mut entries = self.entries.lock().await;

        // Drop closed windows before tracking a new client
        if !entries.contains_key(key) {
            entries.retain(|_, entry| now.duration_since(entry.window_start) < window);
        }

        let entry = entries.entry(key.to_string()).or_insert(WindowEntry {
            requests: 0,
            window_start: now,
        });

        if now.duration_since(entry.window_start) >= window {
            entry.requests = 0;
            entry.window_start = now;
        }

        let reset_after = window.saturating_sub(now.duration_since(entry.window_start));
        let allowed = entry.requests < self.config.max_requests;
        if allowed {
            entry.requests += 1;
        } else {
            warn!("Rate limit exceeded for {}", key);
        }

        RateLimitDecision {
            allowed,
            limit: self.config.max_requests,
            remaining: self.config.max_requests.saturating_sub(entry.requests),
            reset_after,
        }
    }
}
