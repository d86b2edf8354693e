use serde::{Deserialize, Serialize};
use std::fmt::Display;

use super::{Centre, Review, ReviewStats};

/// Travel modes understood by the routing provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    Driving,
    Transit,
    Walking,
    Bicycling,
}

impl TravelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Driving => "driving",
            TravelMode::Transit => "transit",
            TravelMode::Walking => "walking",
            TravelMode::Bicycling => "bicycling",
        }
    }
}

impl Display for TravelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of asking the router for a route between two points
///
/// `Error` is only produced by the ranker, for a call that failed or timed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RouteOutcome {
    Found {
        distance_meters: u64,
        duration_seconds: u64,
    },
    NotFound,
    Error,
}

impl RouteOutcome {
    pub fn distance_meters(&self) -> Option<u64> {
        match self {
            RouteOutcome::Found {
                distance_meters, ..
            } => Some(*distance_meters),
            _ => None,
        }
    }

    pub fn duration_seconds(&self) -> Option<u64> {
        match self {
            RouteOutcome::Found {
                duration_seconds, ..
            } => Some(*duration_seconds),
            _ => None,
        }
    }
}

/// A centre annotated with review statistics and, when a home address was
/// given, travel distance and durations from home
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedCentre {
    #[serde(flatten)]
    pub centre: Centre,
    pub reviews: Vec<Review>,
    pub review_count: usize,
    pub average_rating: f64,
    pub distance_from_home: Option<u64>,
    pub driving_duration: Option<u64>,
    pub transit_duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driving_route: Option<RouteOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transit_route: Option<RouteOutcome>,
}

impl RankedCentre {
    pub fn new(centre: Centre, reviews: Vec<Review>) -> Self {
        let stats = ReviewStats::from_reviews(&reviews);
        Self {
            centre,
            reviews,
            review_count: stats.review_count,
            average_rating: stats.average_rating,
            distance_from_home: None,
            driving_duration: None,
            transit_duration: None,
            driving_route: None,
            transit_route: None,
        }
    }

    /// Records the outcome of the driving and transit route lookups
    pub fn with_routes(mut self, driving: RouteOutcome, transit: RouteOutcome) -> Self {
        self.distance_from_home = driving.distance_meters();
        self.driving_duration = driving.duration_seconds();
        self.transit_duration = transit.duration_seconds();
        self.driving_route = Some(driving);
        self.transit_route = Some(transit);
        self
    }
}

/// Body of a recommendation request
#[derive(Debug, Default, Deserialize)]
pub struct RecommendationRequest {
    #[serde(default)]
    pub location: Option<String>,
}

/// Query parameters of a recommendation request
#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 3;

fn default_limit() -> usize {
    DEFAULT_RECOMMENDATION_LIMIT
}
