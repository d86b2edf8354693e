/// Mapping data provider abstraction
///
/// The ranker needs two things from mapping services: turning a free-text home
/// address into coordinates, and a travel distance/duration between two
/// coordinates. Each concern is a trait so the concrete APIs (OneMap, Google
/// Distance Matrix) can be swapped or faked in tests.
use crate::{
    error::AppResult,
    models::{Coordinates, RouteOutcome, TravelMode},
};

pub mod google_maps;
pub mod onemap;

pub use google_maps::GoogleMapsRouter;
pub use onemap::OneMapGeocoder;

/// Resolves free-text addresses to coordinates
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait GeocodingProvider: Send + Sync {
    /// Returns `Ok(None)` when the address could not be found
    async fn resolve(&self, address: &str) -> AppResult<Option<Coordinates>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Computes travel distance and duration between two points
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RoutingProvider: Send + Sync {
    /// Returns [`RouteOutcome::Found`] or [`RouteOutcome::NotFound`]. Transport
    /// and protocol failures are reported as errors, distinct from "no route".
    async fn route_distance(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        mode: TravelMode,
    ) -> AppResult<RouteOutcome>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
