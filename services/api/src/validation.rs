//! Input validation utilities

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

use crate::models::{ContentRating, Genre, NewVideo, NewVideoPayload};

/// Longest accepted title, in characters
pub const TITLE_MAX_LENGTH: usize = 200;

/// Validate a creation payload, collecting every field error.
///
/// `now` bounds the release date.
pub fn validate_new_video(
    payload: &NewVideoPayload,
    now: DateTime<Utc>,
) -> Result<NewVideo, Vec<String>> {
    let mut errors = Vec::new();

    let video_link = check(validate_video_link(payload.video_link.as_deref()), &mut errors);
    let title = check(validate_title(payload.title.as_deref()), &mut errors);
    let genre = check(validate_genre(payload.genre.as_deref()), &mut errors);
    let content_rating = check(
        validate_content_rating(payload.content_rating.as_deref()),
        &mut errors,
    );
    let release_date = check(
        validate_release_date(payload.release_date.as_deref(), now),
        &mut errors,
    );
    let preview_image = check(
        validate_preview_image(payload.preview_image.as_deref()),
        &mut errors,
    );

    match (
        video_link,
        title,
        genre,
        content_rating,
        release_date,
        preview_image,
    ) {
        (
            Some(video_link),
            Some(title),
            Some(genre),
            Some(content_rating),
            Some(release_date),
            Some(preview_image),
        ) => Ok(NewVideo {
            video_link,
            title,
            genre,
            content_rating,
            release_date,
            preview_image,
        }),
        _ => Err(errors),
    }
}

fn check<T>(result: Result<T, String>, errors: &mut Vec<String>) -> Option<T> {
    result.map_err(|e| errors.push(e)).ok()
}

fn required<'a>(value: Option<&'a str>, message: &str) -> Result<&'a str, String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| message.to_string())
}

/// Validate a video link: a YouTube embed or a Vimeo player URL
pub fn validate_video_link(video_link: Option<&str>) -> Result<String, String> {
    let video_link = required(video_link, "Video link is required")?;

    static VIDEO_LINK_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = VIDEO_LINK_REGEX.get_or_init(|| {
        Regex::new(r"youtube\.com/embed/|player\.vimeo\.com/video/")
            .expect("Failed to compile video link regex")
    });

    if !regex.is_match(video_link) {
        return Err("Video link must be a valid YouTube embed or Vimeo player URL".to_string());
    }

    Ok(video_link.to_string())
}

/// Validate title
pub fn validate_title(title: Option<&str>) -> Result<String, String> {
    let title = required(title, "Title is required")?;

    if title.chars().count() > TITLE_MAX_LENGTH {
        return Err("Title cannot exceed 200 characters".to_string());
    }

    Ok(title.to_string())
}

/// Validate genre
pub fn validate_genre(genre: Option<&str>) -> Result<Genre, String> {
    required(genre, "Genre is required")?
        .parse()
        .map_err(|_| "Genre must be one of: Education, Sports, Movies, Comedy, Lifestyle".to_string())
}

/// Validate content rating
pub fn validate_content_rating(content_rating: Option<&str>) -> Result<ContentRating, String> {
    required(content_rating, "Content rating is required")?
        .parse()
        .map_err(|_| "Content rating must be one of: Anyone, 7+, 12+, 16+, 18+".to_string())
}

/// Validate release date: an RFC 3339 timestamp or a `YYYY-MM-DD` date, not after `now`
pub fn validate_release_date(
    release_date: Option<&str>,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, String> {
    let raw = required(release_date, "Release date is required")?;

    let release_date = DateTime::parse_from_rfc3339(raw)
        .map(|date| date.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(|date| date.and_time(chrono::NaiveTime::MIN).and_utc())
        })
        .map_err(|_| "Release date must be a valid date".to_string())?;

    if release_date > now {
        return Err("Release date cannot be in the future".to_string());
    }

    Ok(release_date)
}

/// Validate preview image: an absolute http(s) URL
pub fn validate_preview_image(preview_image: Option<&str>) -> Result<String, String> {
    let preview_image = required(preview_image, "Preview image is required")?;

    let is_valid = Url::parse(preview_image)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
        .unwrap_or(false);

    if !is_valid {
        return Err("Preview image must be a valid URL".to_string());
    }

    Ok(preview_image.to_string())
}
