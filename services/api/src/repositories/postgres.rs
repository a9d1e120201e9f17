//! PostgreSQL video store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use super::{CounterUpdate, VideoStore};
use crate::{
    models::{Video, NewVideo, VoteKind, Votes},
    query::{PageWindow, SortKey, VideoFilter},
};

const VIDEO_COLUMNS: &str = "id, video_link, title, genre, content_rating, release_date, \
                             preview_image, up_votes, down_votes, view_count, created_at, updated_at";

/// Video row as stored in the `videos` table
#[derive(Debug, FromRow)]
struct VideoRow {
    id: Uuid,
    video_link: String,
    title: String,
    genre: String,
    content_rating: String,
    release_date: DateTime<Utc>,
    preview_image: String,
    up_votes: i64,
    down_votes: i64,
    view_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<VideoRow> for Video {
    type Error = DatabaseError;

    fn try_from(row: VideoRow) -> DatabaseResult<Self> {
        let genre = row
            .genre
            .parse()
            .map_err(|e| DatabaseError::Corrupt(format!("video {}: {}", row.id, e)))?;
        let content_rating = row
            .content_rating
            .parse()
            .map_err(|e| DatabaseError::Corrupt(format!("video {}: {}", row.id, e)))?;

        Ok(Video {
            id: row.id,
            video_link: row.video_link,
            title: row.title,
            genre,
            content_rating,
            release_date: row.release_date,
            preview_image: row.preview_image,
            votes: Votes {
                up_votes: row.up_votes,
                down_votes: row.down_votes,
            },
            view_count: row.view_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Column holding a vote counter
fn vote_column(kind: VoteKind) -> &'static str {
    match kind {
        VoteKind::UpVote => "up_votes",
        VoteKind::DownVote => "down_votes",
    }
}

fn order_clause(sort: SortKey) -> &'static str {
    match sort {
        SortKey::ReleaseDate => "release_date DESC, id ASC",
        SortKey::ViewCount => "view_count DESC, id ASC",
        SortKey::Title => "LOWER(title) ASC, id ASC",
    }
}

/// Escape LIKE wildcards so user input matches literally
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &VideoFilter) {
    builder.push(" WHERE TRUE");

    if let Some(title) = &filter.title {
        builder
            .push(" AND title ILIKE ")
            .push_bind(format!("%{}%", escape_like(title)));
    }

    if let Some(genres) = &filter.genres {
        let names: Vec<String> = genres.iter().map(|g| g.as_str().to_string()).collect();
        builder.push(" AND genre = ANY(").push_bind(names).push(")");
    }

    if let Some(ratings) = &filter.content_ratings {
        let names: Vec<String> = ratings.iter().map(|r| r.as_str().to_string()).collect();
        builder
            .push(" AND content_rating = ANY(")
            .push_bind(names)
            .push(")");
    }
}

/// Video repository backed by PostgreSQL
#[derive(Clone)]
pub struct PgVideoStore {
    pool: PgPool,
}

impl PgVideoStore {
    /// Create a new video store
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded schema migrations
    pub async fn migrate(&self) -> DatabaseResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;

        info!("Video schema migrations applied");
        Ok(())
    }

    async fn exists(&self, id: Uuid) -> DatabaseResult<bool> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM videos WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::Query)
    }
}

#[async_trait]
impl VideoStore for PgVideoStore {
    async fn find(
        &self,
        filter: &VideoFilter,
        sort: SortKey,
        window: PageWindow,
    ) -> DatabaseResult<Vec<Video>> {
        let mut builder = QueryBuilder::new(format!("SELECT {} FROM videos", VIDEO_COLUMNS));
        push_filter(&mut builder, filter);
        builder
            .push(" ORDER BY ")
            .push(order_clause(sort))
            .push(" LIMIT ")
            .push_bind(i64::from(window.limit()))
            .push(" OFFSET ")
            .push_bind(i64::try_from(window.skip()).unwrap_or(i64::MAX));

        let rows: Vec<VideoRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        rows.into_iter().map(Video::try_from).collect()
    }

    async fn count(&self, filter: &VideoFilter) -> DatabaseResult<u64> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM videos");
        push_filter(&mut builder, filter);

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Video>> {
        let row: Option<VideoRow> =
            sqlx::query_as(&format!("SELECT {} FROM videos WHERE id = $1", VIDEO_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(DatabaseError::Query)?;

        row.map(Video::try_from).transpose()
    }

    async fn insert(&self, video: &NewVideo) -> DatabaseResult<Video> {
        let row: VideoRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO videos (video_link, title, genre, content_rating, release_date, preview_image)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            VIDEO_COLUMNS
        ))
        .bind(&video.video_link)
        .bind(&video.title)
        .bind(video.genre.as_str())
        .bind(video.content_rating.as_str())
        .bind(video.release_date)
        .bind(&video.preview_image)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        info!("Stored video {}", row.id);
        Video::try_from(row)
    }

    async fn adjust_votes(
        &self,
        id: Uuid,
        kind: VoteKind,
        delta: i64,
    ) -> DatabaseResult<CounterUpdate> {
        let column = vote_column(kind);
        let row: Option<VideoRow> = sqlx::query_as(&format!(
            r#"
            UPDATE videos
            SET {column} = {column} + $2, updated_at = NOW()
            WHERE id = $1 AND {column} + $2 >= 0
            RETURNING {columns}
            "#,
            column = column,
            columns = VIDEO_COLUMNS
        ))
        .bind(id)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        match row {
            Some(row) => Ok(CounterUpdate::Updated(Video::try_from(row)?)),
            None if self.exists(id).await? => Ok(CounterUpdate::Underflow),
            None => Ok(CounterUpdate::NotFound),
        }
    }

    async fn increment_views(&self, id: Uuid) -> DatabaseResult<Option<Video>> {
        let row: Option<VideoRow> = sqlx::query_as(&format!(
            r#"
            UPDATE videos
            SET view_count = view_count + 1, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            VIDEO_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        row.map(Video::try_from).transpose()
    }

    async fn health_check(&self) -> DatabaseResult<bool> {
        common::database::health_check(&self.pool).await
    }
}
