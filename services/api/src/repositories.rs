//! Repositories for video persistence
//!
//! [`VideoStore`] is the seam between the service layer and storage. Counter
//! changes are single atomic operations on the store so concurrent votes and
//! views on one video never overwrite each other.

use std::sync::Arc;

use async_trait::async_trait;
use common::error::DatabaseResult;
use uuid::Uuid;

use crate::{
    models::{NewVideo, Video, VoteKind},
    query::{PageWindow, SortKey, VideoFilter},
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryVideoStore;
pub use postgres::PgVideoStore;

/// Outcome of a conditional counter update
#[derive(Debug, Clone, PartialEq)]
pub enum CounterUpdate {
    /// The counter changed; carries the record after the change
    Updated(Video),
    /// No video with that id
    NotFound,
    /// The change would have made the counter negative; nothing was written
    Underflow,
}

/// Video persistence operations
#[async_trait]
pub trait VideoStore: Send + Sync {
    /// One page of videos matching `filter`, in `sort` order
    async fn find(
        &self,
        filter: &VideoFilter,
        sort: SortKey,
        window: PageWindow,
    ) -> DatabaseResult<Vec<Video>>;

    /// Number of videos matching `filter`, ignoring pagination
    async fn count(&self, filter: &VideoFilter) -> DatabaseResult<u64>;

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Video>>;

    /// Store a new video with zeroed counters and return it with its id
    async fn insert(&self, video: &NewVideo) -> DatabaseResult<Video>;

    /// Add `delta` to a vote counter unless the result would be negative
    async fn adjust_votes(&self, id: Uuid, kind: VoteKind, delta: i64)
    -> DatabaseResult<CounterUpdate>;

    /// Add one view; `None` when the video does not exist
    async fn increment_views(&self, id: Uuid) -> DatabaseResult<Option<Video>>;

    /// Check if the store is reachable
    async fn health_check(&self) -> DatabaseResult<bool>;
}

/// Store handle shared by every request
pub type SharedVideoStore = Arc<dyn VideoStore>;
