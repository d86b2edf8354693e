/// Google Distance Matrix routing provider
///
/// Issues a single origin/destination query per call. Transit queries prefer
/// routes with less walking.
use crate::{
    error::{AppError, AppResult},
    models::{Coordinates, DistanceMatrixResponse, RouteOutcome, TravelMode},
    services::providers::RoutingProvider,
};
use reqwest::Client as HttpClient;

#[derive(Clone)]
pub struct GoogleMapsRouter {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl GoogleMapsRouter {
    pub fn new(api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
        }
    }

    /// Maps a Distance Matrix response onto a route outcome
    fn interpret_response(response: DistanceMatrixResponse) -> AppResult<RouteOutcome> {
        if response.status != "OK" {
            return Err(AppError::ExternalApi(format!(
                "Distance Matrix API returned status {}: {}",
                response.status,
                response.error_message.unwrap_or_default()
            )));
        }

        let element = response
            .rows
            .into_iter()
            .next()
            .and_then(|row| row.elements.into_iter().next())
            .ok_or_else(|| {
                AppError::ExternalApi("Distance Matrix response has no elements".to_string())
            })?;

        match element.status.as_str() {
            "OK" => match (element.distance, element.duration) {
                (Some(distance), Some(duration)) => Ok(RouteOutcome::Found {
                    distance_meters: distance.value,
                    duration_seconds: duration.value,
                }),
                _ => Err(AppError::ExternalApi(
                    "Distance Matrix element is missing distance or duration".to_string(),
                )),
            },
            "ZERO_RESULTS" | "NOT_FOUND" => Ok(RouteOutcome::NotFound),
            other => Err(AppError::ExternalApi(format!(
                "Distance Matrix element status {}",
                other
            ))),
        }
    }
}

#[async_trait::async_trait]
impl RoutingProvider for GoogleMapsRouter {
    async fn route_distance(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        mode: TravelMode,
    ) -> AppResult<RouteOutcome> {
        let url = format!("{}/maps/api/distancematrix/json", self.api_url);

        let mut params = vec![
            ("origins", origin.to_string()),
            ("destinations", destination.to_string()),
            ("mode", mode.as_str().to_string()),
            ("key", self.api_key.clone()),
        ];
        if mode == TravelMode::Transit {
            params.push(("transit_routing_preference", "less_walking".to_string()));
        }

        let response = self.http_client.get(&url).query(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Distance Matrix API returned status {}: {}",
                status, body
            )));
        }

        let matrix: DistanceMatrixResponse = response.json().await?;
        let outcome = Self::interpret_response(matrix)?;

        tracing::debug!(
            origin = %origin,
            destination = %destination,
            mode = %mode,
            outcome = ?outcome,
            provider = "google_maps",
            "Route distance fetched"
        );

        Ok(outcome)
    }

    fn name(&self) -> &'static str {
        "google_maps"
    }
}
