//! Search, filter, sort and pagination for video listings
//!
//! Raw query-string parameters are validated once into a [`VideoSearch`],
//! which every store understands: a [`VideoFilter`] predicate, a [`SortKey`]
//! and a [`PageWindow`]. [`Pagination`] describes the page that came back.

use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiError, ApiResult},
    models::{ContentRating, Genre, Video},
};

/// Page size used when the client does not ask for one
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page size a client can get
pub const MAX_PAGE_SIZE: u32 = 100;

/// Genre sentinel meaning "no genre restriction"
pub const ALL_GENRES: &str = "All";

/// Query parameters for `GET /videos`, as sent by the client
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoQueryParams {
    /// Case-insensitive title substring
    pub title: Option<String>,
    /// Comma-separated genres, or `All`
    pub genres: Option<String>,
    /// Minimum content rating
    pub content_rating: Option<String>,
    /// `releaseDate`, `viewCount` or `title`
    pub sort_by: Option<String>,
    /// Page number (1-based)
    pub page: Option<String>,
    /// Number of items per page
    pub limit: Option<String>,
}

/// Sort order of a listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Newest release first
    #[default]
    ReleaseDate,
    /// Most viewed first
    ViewCount,
    /// Alphabetical
    Title,
}

impl SortKey {
    /// Unknown sort keys fall back to the release date.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim() {
            "viewCount" => SortKey::ViewCount,
            "title" => SortKey::Title,
            _ => SortKey::ReleaseDate,
        }
    }

    pub fn is_descending(&self) -> bool {
        !matches!(self, SortKey::Title)
    }
}

/// Predicate over videos. `None` means "unconstrained".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoFilter {
    pub title: Option<String>,
    pub genres: Option<Vec<Genre>>,
    pub content_ratings: Option<Vec<ContentRating>>,
}

impl VideoFilter {
    pub fn matches(&self, video: &Video) -> bool {
        if let Some(title) = &self.title {
            if !video.title.to_lowercase().contains(&title.to_lowercase()) {
                return false;
            }
        }

        if let Some(genres) = &self.genres {
            if !genres.contains(&video.genre) {
                return false;
            }
        }

        if let Some(ratings) = &self.content_ratings {
            if !ratings.contains(&video.content_rating) {
                return false;
            }
        }

        true
    }
}

/// Page bounds with the limit already clamped into `[1, MAX_PAGE_SIZE]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    page: u32,
    limit: u32,
}

impl PageWindow {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    /// Effective page size
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of matching records before this page
    pub fn skip(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for PageWindow {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// A validated listing request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoSearch {
    pub filter: VideoFilter,
    pub sort: SortKey,
    pub window: PageWindow,
}

impl TryFrom<VideoQueryParams> for VideoSearch {
    type Error = ApiError;

    fn try_from(params: VideoQueryParams) -> ApiResult<Self> {
        let title = params
            .title
            .as_deref()
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .map(str::to_string);

        let genres = match non_empty(params.genres.as_deref()) {
            Some(raw) => genre_filter(raw)?,
            None => None,
        };

        let content_ratings = non_empty(params.content_rating.as_deref())
            .and_then(content_rating_filter);

        let sort = non_empty(params.sort_by.as_deref())
            .map(SortKey::parse_lenient)
            .unwrap_or_default();

        let page = parse_number("page", params.page.as_deref())?.unwrap_or(1);
        let limit =
            parse_number("limit", params.limit.as_deref())?.unwrap_or(i64::from(DEFAULT_PAGE_SIZE));

        Ok(Self {
            filter: VideoFilter {
                title,
                genres,
                content_ratings,
            },
            sort,
            window: PageWindow::new(saturate(page), saturate(limit)),
        })
    }
}

/// Pagination metadata of a listing response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub page: u32,
    pub total_pages: u64,
    pub has_more: bool,
}

impl Pagination {
    pub fn new(window: PageWindow, total: u64, returned: usize) -> Self {
        Self {
            total,
            page: window.page(),
            total_pages: total.div_ceil(u64::from(window.limit())),
            has_more: window.skip() + (returned as u64) < total,
        }
    }
}

/// Ratings a listing is restricted to for the requested rating.
///
/// `Anyone` is no restriction. Any other rating expands to itself and every
/// stricter rating; unknown values fall back to all restricted ratings.
pub fn content_rating_filter(raw: &str) -> Option<Vec<ContentRating>> {
    match raw.trim().parse::<ContentRating>() {
        Ok(ContentRating::Anyone) => None,
        Ok(rating) => Some(rating.at_least_as_strict_as()),
        Err(_) => Some(ContentRating::restricted()),
    }
}

/// Genres a listing is restricted to, `None` when `All` is requested.
pub fn genre_filter(raw: &str) -> ApiResult<Option<Vec<Genre>>> {
    let names: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect();

    if names.is_empty() || names.contains(&ALL_GENRES) {
        return Ok(None);
    }

    let mut genres = Vec::with_capacity(names.len());
    for name in names {
        let genre = name.parse::<Genre>().map_err(|_| {
            ApiError::BadRequest(format!(
                "Genre must be one of: All, {}",
                Genre::ALL.map(|g| g.as_str()).join(", ")
            ))
        })?;
        if !genres.contains(&genre) {
            genres.push(genre);
        }
    }

    Ok(Some(genres))
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}

fn parse_number(name: &str, raw: Option<&str>) -> ApiResult<Option<i64>> {
    non_empty(raw)
        .map(|value| {
            value
                .parse::<i64>()
                .map_err(|_| ApiError::BadRequest(format!("{} must be an integer", name)))
        })
        .transpose()
}

fn saturate(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}
