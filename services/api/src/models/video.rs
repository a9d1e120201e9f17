//! Video models for the API service

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Raised when a string does not name a member of one of the closed enums
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Video genre
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Genre {
    Education,
    Sports,
    Movies,
    Comedy,
    Lifestyle,
}

impl Genre {
    pub const ALL: [Genre; 5] = [
        Genre::Education,
        Genre::Sports,
        Genre::Movies,
        Genre::Comedy,
        Genre::Lifestyle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Education => "Education",
            Genre::Sports => "Sports",
            Genre::Movies => "Movies",
            Genre::Comedy => "Comedy",
            Genre::Lifestyle => "Lifestyle",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Genre {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Genre::ALL
            .into_iter()
            .find(|genre| genre.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("genre", s))
    }
}

/// Age-appropriateness classification.
///
/// Variants are declared from least to most restrictive, so the derived
/// `Ord` is the age-gating order `Anyone < 7+ < 12+ < 16+ < 18+`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContentRating {
    #[serde(rename = "Anyone")]
    Anyone,
    #[serde(rename = "7+")]
    SevenPlus,
    #[serde(rename = "12+")]
    TwelvePlus,
    #[serde(rename = "16+")]
    SixteenPlus,
    #[serde(rename = "18+")]
    EighteenPlus,
}

impl ContentRating {
    pub const ALL: [ContentRating; 5] = [
        ContentRating::Anyone,
        ContentRating::SevenPlus,
        ContentRating::TwelvePlus,
        ContentRating::SixteenPlus,
        ContentRating::EighteenPlus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentRating::Anyone => "Anyone",
            ContentRating::SevenPlus => "7+",
            ContentRating::TwelvePlus => "12+",
            ContentRating::SixteenPlus => "16+",
            ContentRating::EighteenPlus => "18+",
        }
    }

    /// This rating followed by every stricter one, in ascending order.
    pub fn at_least_as_strict_as(self) -> Vec<ContentRating> {
        ContentRating::ALL
            .into_iter()
            .filter(|rating| *rating >= self)
            .collect()
    }

    /// Every rating that carries an age restriction.
    pub fn restricted() -> Vec<ContentRating> {
        ContentRating::SevenPlus.at_least_as_strict_as()
    }
}

impl fmt::Display for ContentRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentRating {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentRating::ALL
            .into_iter()
            .find(|rating| rating.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("content rating", s))
    }
}

/// Vote counters of a video
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Votes {
    pub up_votes: i64,
    pub down_votes: i64,
}

impl Votes {
    pub fn get_mut(&mut self, kind: VoteKind) -> &mut i64 {
        match kind {
            VoteKind::UpVote => &mut self.up_votes,
            VoteKind::DownVote => &mut self.down_votes,
        }
    }
}

/// Video record as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: Uuid,
    pub video_link: String,
    pub title: String,
    pub genre: Genre,
    pub content_rating: ContentRating,
    pub release_date: DateTime<Utc>,
    pub preview_image: String,
    pub votes: Votes,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    pub fn total_votes(&self) -> i64 {
        self.votes.up_votes + self.votes.down_votes
    }

    /// Share of up votes as a percentage, 0 when nobody voted.
    pub fn vote_ratio(&self) -> f64 {
        let total = self.total_votes();
        if total == 0 {
            return 0.0;
        }
        self.votes.up_votes as f64 / total as f64 * 100.0
    }
}

/// Video as returned to clients, with the derived vote figures
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResponse {
    #[serde(flatten)]
    pub video: Video,
    pub total_votes: i64,
    pub vote_ratio: f64,
}

impl From<Video> for VideoResponse {
    fn from(video: Video) -> Self {
        Self {
            total_votes: video.total_votes(),
            vote_ratio: video.vote_ratio(),
            video,
        }
    }
}

/// Validated payload for a new video
#[derive(Debug, Clone, PartialEq)]
pub struct NewVideo {
    pub video_link: String,
    pub title: String,
    pub genre: Genre,
    pub content_rating: ContentRating,
    pub release_date: DateTime<Utc>,
    pub preview_image: String,
}

/// Raw creation request body; every field is checked by `validation`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVideoPayload {
    pub video_link: Option<String>,
    pub title: Option<String>,
    pub genre: Option<String>,
    pub content_rating: Option<String>,
    pub release_date: Option<String>,
    pub preview_image: Option<String>,
}

/// Which vote counter to change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteKind {
    UpVote,
    DownVote,
}

impl VoteKind {
    /// Name of the counter in the JSON representation
    pub fn counter_name(&self) -> &'static str {
        match self {
            VoteKind::UpVote => "upVotes",
            VoteKind::DownVote => "downVotes",
        }
    }
}

impl FromStr for VoteKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upVote" => Ok(VoteKind::UpVote),
            "downVote" => Ok(VoteKind::DownVote),
            other => Err(UnknownVariant::new("vote", other)),
        }
    }
}

/// Direction of a vote change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteChange {
    Increase,
    Decrease,
}

impl VoteChange {
    pub fn delta(&self) -> i64 {
        match self {
            VoteChange::Increase => 1,
            VoteChange::Decrease => -1,
        }
    }
}

impl FromStr for VoteChange {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "increase" => Ok(VoteChange::Increase),
            "decrease" => Ok(VoteChange::Decrease),
            other => Err(UnknownVariant::new("change", other)),
        }
    }
}

/// Request body for `PATCH /videos/:id/votes`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VoteRequest {
    pub vote: Option<String>,
    pub change: Option<String>,
}
