use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::error::{AppError, AppResult};

/// Storage tag for dementia daycare review targets
pub const DEMENTIA_DAYCARE_TAG: &str = "CARESERVICE::DEMENTIA_DAYCARE";

/// The entity a review is attached to
///
/// Reviews reference their target by tag and id rather than a foreign key,
/// so the tag is checked here when rows are loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id")]
pub enum TargetRef {
    #[serde(rename = "CARESERVICE::DEMENTIA_DAYCARE")]
    DementiaDaycare(i64),
}

impl TargetRef {
    /// Rebuilds a target from its stored tag and id
    pub fn from_parts(tag: &str, id: i64) -> AppResult<Self> {
        match tag {
            DEMENTIA_DAYCARE_TAG => Ok(TargetRef::DementiaDaycare(id)),
            other => Err(AppError::Internal(format!(
                "Unknown review target type: {}",
                other
            ))),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            TargetRef::DementiaDaycare(_) => DEMENTIA_DAYCARE_TAG,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            TargetRef::DementiaDaycare(id) => *id,
        }
    }
}

impl Display for TargetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.tag(), self.id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewSource {
    Google,
    InApp,
}

impl ReviewSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewSource::Google => "GOOGLE",
            ReviewSource::InApp => "IN_APP",
        }
    }

    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "GOOGLE" => Ok(ReviewSource::Google),
            "IN_APP" => Ok(ReviewSource::InApp),
            other => Err(AppError::Internal(format!(
                "Unknown review source: {}",
                other
            ))),
        }
    }
}

/// A stored review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub target: TargetRef,
    pub review_source: ReviewSource,
    pub overall_rating: i32,
    pub content: Option<String>,
    pub author_name: String,
    pub author_id: Option<String>,
    pub google_review_id: Option<String>,
    pub published_time: DateTime<Utc>,
}

/// A review as submitted for ingestion
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub target: TargetRef,
    pub review_source: ReviewSource,
    pub overall_rating: i32,
    pub content: Option<String>,
    pub author_name: String,
    pub author_id: Option<String>,
    pub google_review_id: Option<String>,
    pub published_time: Option<DateTime<Utc>>,
}

impl NewReview {
    /// External id a review is upserted by, `None` for in-app reviews
    ///
    /// Google reviews must carry a `google_review_id`; in-app reviews must not.
    pub fn google_key(&self) -> AppResult<Option<&str>> {
        let google_id = self
            .google_review_id
            .as_deref()
            .filter(|id| !id.trim().is_empty());

        match (self.review_source, google_id) {
            (ReviewSource::Google, Some(id)) => Ok(Some(id)),
            (ReviewSource::Google, None) => Err(AppError::InvalidInput(
                "Google reviews require a google_review_id".to_string(),
            )),
            (ReviewSource::InApp, None) => Ok(None),
            (ReviewSource::InApp, Some(_)) => Err(AppError::InvalidInput(
                "In-app reviews cannot carry a google_review_id".to_string(),
            )),
        }
    }

    /// Materializes the review, stamping it with `now` when no published time was given
    pub fn into_review(self, id: i64, now: DateTime<Utc>) -> Review {
        Review {
            id,
            target: self.target,
            review_source: self.review_source,
            overall_rating: self.overall_rating,
            content: self.content,
            author_name: self.author_name,
            author_id: self.author_id,
            google_review_id: self.google_review_id,
            published_time: self.published_time.unwrap_or(now),
        }
    }
}

/// Aggregate rating statistics for a set of reviews
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReviewStats {
    pub review_count: usize,
    pub average_rating: f64,
}

impl ReviewStats {
    /// Mean overall rating rounded to one decimal place, 0.0 when there are no reviews
    pub fn from_reviews(reviews: &[Review]) -> Self {
        let review_count = reviews.len();
        if review_count == 0 {
            return Self {
                review_count,
                average_rating: 0.0,
            };
        }

        let total: i64 = reviews.iter().map(|r| r.overall_rating as i64).sum();
        let mean = total as f64 / review_count as f64;

        Self {
            review_count,
            average_rating: (mean * 10.0).round() / 10.0,
        }
    }
}
