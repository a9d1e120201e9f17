//! In-memory video store, used by tests and local development

use std::{cmp::Ordering, collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use common::error::DatabaseResult;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CounterUpdate, VideoStore};
use crate::{
    models::{NewVideo, Video, VoteKind, Votes},
    query::{PageWindow, SortKey, VideoFilter},
};

/// Video store keeping every record in a map behind one lock
#[derive(Clone, Default)]
pub struct MemoryVideoStore {
    videos: Arc<RwLock<HashMap<Uuid, Video>>>,
}

impl MemoryVideoStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored videos
    pub async fn len(&self) -> usize {
        self.videos.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.videos.read().await.is_empty()
    }
}

fn compare(sort: SortKey, a: &Video, b: &Video) -> Ordering {
    let primary = match sort {
        SortKey::ReleaseDate => b.release_date.cmp(&a.release_date),
        SortKey::ViewCount => b.view_count.cmp(&a.view_count),
        SortKey::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl VideoStore for MemoryVideoStore {
    async fn find(
        &self,
        filter: &VideoFilter,
        sort: SortKey,
        window: PageWindow,
    ) -> DatabaseResult<Vec<Video>> {
        let videos = self.videos.read().await;

        let mut matching: Vec<&Video> = videos.values().filter(|v| filter.matches(v)).collect();
        matching.sort_by(|a, b| compare(sort, a, b));

        let skip = usize::try_from(window.skip()).unwrap_or(usize::MAX);
        Ok(matching
            .into_iter()
            .skip(skip)
            .take(window.limit() as usize)
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &VideoFilter) -> DatabaseResult<u64> {
        let videos = self.videos.read().await;
        Ok(videos.values().filter(|v| filter.matches(v)).count() as u64)
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Video>> {
        Ok(self.videos.read().await.get(&id).cloned())
    }

    async fn insert(&self, video: &NewVideo) -> DatabaseResult<Video> {
        let now = Utc::now();
        let video = Video {
            id: Uuid::new_v4(),
            video_link: video.video_link.clone(),
            title: video.title.clone(),
            genre: video.genre,
            content_rating: video.content_rating,
            release_date: video.release_date,
            preview_image: video.preview_image.clone(),
            votes: Votes::default(),
            view_count: 0,
            created_at: now,
            updated_at: now,
        };

        self.videos.write().await.insert(video.id, video.clone());
        Ok(video)
    }

    async fn adjust_votes(
        &self,
        id: Uuid,
        kind: VoteKind,
        delta: i64,
    ) -> DatabaseResult<CounterUpdate> {
        let mut videos = self.videos.write().await;
        let Some(video) = videos.get_mut(&id) else {
            return Ok(CounterUpdate::NotFound);
        };

        let counter = video.votes.get_mut(kind);
        if *counter + delta < 0 {
            return Ok(CounterUpdate::Underflow);
        }
        *counter += delta;
        video.updated_at = Utc::now();

        Ok(CounterUpdate::Updated(video.clone()))
    }

    async fn increment_views(&self, id: Uuid) -> DatabaseResult<Option<Video>> {
        let mut videos = self.videos.write().await;
        Ok(videos.get_mut(&id).map(|video| {
            video.view_count += 1;
            video.updated_at = Utc::now();
            video.clone()
        }))
    }

    async fn health_check(&self) -> DatabaseResult<bool> {
        Ok(true)
    }
}
