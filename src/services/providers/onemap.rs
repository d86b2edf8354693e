/// OneMap geocoding provider
///
/// Resolves Singapore addresses and postal codes through OneMap's elastic search
/// endpoint. Only the first hit is used. Results, including misses, are cached
/// in Redis per normalised address. If Redis cannot be read, OneMap is queried
/// directly.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{Coordinates, OneMapSearchResponse},
    services::providers::GeocodingProvider,
};
use reqwest::Client as HttpClient;

const GEOCODE_CACHE_TTL: u64 = 604800; // 1 week

#[derive(Clone)]
pub struct OneMapGeocoder {
    http_client: HttpClient,
    api_url: String,
    cache: Cache,
}

impl OneMapGeocoder {
    pub fn new(cache: Cache, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url,
            cache,
        }
    }

    /// Extracts the coordinates of the first search hit
    fn parse_search_response(response: OneMapSearchResponse) -> AppResult<Option<Coordinates>> {
        if response.found == 0 {
            return Ok(None);
        }

        let Some(first) = response.results.into_iter().next() else {
            return Ok(None);
        };

        let lat: f64 = first.latitude.trim().parse().map_err(|_| {
            AppError::ExternalApi(format!("Invalid OneMap latitude: {}", first.latitude))
        })?;
        let lng: f64 = first.longitude.trim().parse().map_err(|_| {
            AppError::ExternalApi(format!("Invalid OneMap longitude: {}", first.longitude))
        })?;

        Coordinates::new(lat, lng)
            .map(Some)
            .map_err(|e| AppError::ExternalApi(format!("OneMap returned {}", e)))
    }
}

#[async_trait::async_trait]
impl GeocodingProvider for OneMapGeocoder {
    async fn resolve(&self, address: &str) -> AppResult<Option<Coordinates>> {
        let address = address.trim();
        if address.is_empty() {
            return Ok(None);
        }

        cached!(
            self.cache,
            CacheKey::Geocode(address.to_string()),
            GEOCODE_CACHE_TTL,
            async move {
                let url = format!("{}/api/common/elastic/search", self.api_url);

                let response = self
                    .http_client
                    .get(&url)
                    .query(&[
                        ("searchVal", address),
                        ("returnGeom", "Y"),
                        ("getAddrDetails", "Y"),
                        ("pageNum", "1"),
                    ])
                    .send()
                    .await?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(AppError::ExternalApi(format!(
                        "OneMap API returned status {}: {}",
                        status, body
                    )));
                }

                let search: OneMapSearchResponse = response.json().await?;
                let found = search.found;
                let coordinates = Self::parse_search_response(search)?;

                tracing::info!(
                    address = %address,
                    found = found,
                    resolved = coordinates.is_some(),
                    provider = "onemap",
                    "Address geocoded"
                );

                Ok(coordinates)
            }
        )
    }

    fn name(&self) -> &'static str {
        "onemap"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_redis_client;
    use crate::models::OneMapAddress;
    use axum::{http::StatusCode, routing::get, Json, Router};
    use serde_json::{json, Value};

    /// Serves a fixed OneMap search response on an ephemeral local port
    async fn onemap_stub(status: StatusCode, body: Value) -> String {
        let app = Router::new().route(
            "/api/common/elastic/search",
            get(move || {
                let body = body.clone();
                async move { (status, Json(body)) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    /// A cache whose Redis endpoint refuses connections
    async fn unreachable_cache() -> Cache {
        let client = create_redis_client("redis://127.0.0.1:1").unwrap();
        let (cache, _handle) = Cache::new(client).await;
        cache
    }

    fn address(lat: &str, lng: &str) -> OneMapAddress {
        OneMapAddress {
            address: Some("1 TAMPINES WALK SINGAPORE 528523".to_string()),
            postal: Some("528523".to_string()),
            latitude: lat.to_string(),
            longitude: lng.to_string(),
        }
    }

    #[test]
    fn test_parse_first_result() {
        let response = OneMapSearchResponse {
            found: 2,
            results: vec![address("1.35353", "103.94"), address("1.0", "103.0")],
        };

        let coords = OneMapGeocoder::parse_search_response(response)
            .unwrap()
            .unwrap();
        assert_eq!(coords, Coordinates { lat: 1.35353, lng: 103.94 });
    }

    #[test]
    fn test_parse_not_found() {
        let response = OneMapSearchResponse {
            found: 0,
            results: vec![],
        };
        assert_eq!(OneMapGeocoder::parse_search_response(response).unwrap(), None);
    }

    #[test]
    fn test_parse_found_without_results() {
        let response = OneMapSearchResponse {
            found: 1,
            results: vec![],
        };
        assert_eq!(OneMapGeocoder::parse_search_response(response).unwrap(), None);
    }

    #[test]
    fn test_parse_malformed_latitude() {
        let response = OneMapSearchResponse {
            found: 1,
            results: vec![address("NIL", "103.94")],
        };
        assert!(matches!(
            OneMapGeocoder::parse_search_response(response),
            Err(AppError::ExternalApi(_))
        ));
    }

    #[test]
    fn test_parse_out_of_range_coordinates() {
        let response = OneMapSearchResponse {
            found: 1,
            results: vec![address("95.0", "103.94")],
        };
        assert!(OneMapGeocoder::parse_search_response(response).is_err());
    }

    #[tokio::test]
    async fn test_resolve_bypasses_unreachable_cache() {
        let api_url = onemap_stub(
            StatusCode::OK,
            json!({
                "found": 1,
                "totalNumPages": 1,
                "pageNum": 1,
                "results": [{
                    "ADDRESS": "123 ANG MO KIO AVENUE 3 SINGAPORE 560123",
                    "POSTAL": "560123",
                    "LATITUDE": "1.3691",
                    "LONGITUDE": "103.8454"
                }]
            }),
        )
        .await;
        let geocoder = OneMapGeocoder::new(unreachable_cache().await, api_url);

        let coords = geocoder.resolve("560123").await.unwrap();

        assert_eq!(coords, Some(Coordinates { lat: 1.3691, lng: 103.8454 }));
    }

    #[tokio::test]
    async fn test_resolve_reports_onemap_error_when_cache_unreachable() {
        let api_url = onemap_stub(StatusCode::SERVICE_UNAVAILABLE, json!({ "error": "down" })).await;
        let geocoder = OneMapGeocoder::new(unreachable_cache().await, api_url);

        let result = geocoder.resolve("560123").await;

        assert!(matches!(result, Err(AppError::ExternalApi(_))));
    }
}
