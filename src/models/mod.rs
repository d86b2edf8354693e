use serde::Deserialize;

pub mod centre;
pub mod ranking;
pub mod review;

pub use centre::{Centre, CentrePatch, Coordinates, MergePolicy};
pub use ranking::{
    RankedCentre, RecommendationQuery, RecommendationRequest, RouteOutcome, TravelMode,
    DEFAULT_RECOMMENDATION_LIMIT,
};
pub use review::{NewReview, Review, ReviewSource, ReviewStats, TargetRef};

// ============================================================================
// OneMap API Types
// ============================================================================

/// Response of the OneMap elastic search endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OneMapSearchResponse {
    pub found: u32,
    #[serde(default)]
    pub results: Vec<OneMapAddress>,
}

/// A single OneMap search hit. Coordinates are returned as strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct OneMapAddress {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub postal: Option<String>,
    pub latitude: String,
    pub longitude: String,
}

// ============================================================================
// Google Distance Matrix API Types
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct DistanceMatrixResponse {
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub rows: Vec<DistanceMatrixRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DistanceMatrixRow {
    #[serde(default)]
    pub elements: Vec<DistanceMatrixElement>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DistanceMatrixElement {
    pub status: String,
    #[serde(default)]
    pub distance: Option<DistanceMatrixValue>,
    #[serde(default)]
    pub duration: Option<DistanceMatrixValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DistanceMatrixValue {
    pub value: u64,
    #[serde(default)]
    pub text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_onemap_response_deserialization() {
        let json = r#"{
            "found": 1,
            "totalNumPages": 1,
            "pageNum": 1,
            "results": [{
                "SEARCHVAL": "BLK 123 ANG MO KIO",
                "BLK_NO": "123",
                "ROAD_NAME": "ANG MO KIO AVENUE 3",
                "BUILDING": "NIL",
                "ADDRESS": "123 ANG MO KIO AVENUE 3 SINGAPORE 560123",
                "POSTAL": "560123",
                "X": "29812.0",
                "Y": "38650.5",
                "LATITUDE": "1.36896",
                "LONGITUDE": "103.84526"
            }]
        }"#;

        let response: OneMapSearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.found, 1);
        assert_eq!(response.results[0].latitude, "1.36896");
        assert_eq!(response.results[0].postal.as_deref(), Some("560123"));
    }

    #[test]
    fn test_distance_matrix_deserialization() {
        let json = r#"{
            "destination_addresses": ["Singapore"],
            "origin_addresses": ["Singapore"],
            "rows": [{
                "elements": [{
                    "distance": {"text": "8.1 km", "value": 8123},
                    "duration": {"text": "14 mins", "value": 840},
                    "status": "OK"
                }]
            }],
            "status": "OK"
        }"#;

        let response: DistanceMatrixResponse = serde_json::from_str(json).unwrap();
        let element = &response.rows[0].elements[0];
        assert_eq!(response.status, "OK");
        assert_eq!(element.distance.as_ref().unwrap().value, 8123);
        assert_eq!(element.duration.as_ref().unwrap().value, 840);
    }
}
