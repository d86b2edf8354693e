use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::timeout;

use crate::{
    error::{AppError, AppResult},
    models::{Centre, Coordinates, RankedCentre, RouteOutcome, TargetRef, TravelMode},
    services::{
        directory::{DirectoryStore, ReviewStore},
        geo,
        providers::{GeocodingProvider, RoutingProvider},
    },
};

/// Ranks daycare centres for a caregiver, optionally relative to their home
///
/// With a home address the directory is narrowed to the `limit` nearest
/// centres by great-circle distance, each survivor is routed by car and by
/// public transport, and the final list is ordered by driving distance.
/// Without an address the first `limit` centres are returned in directory order.
pub struct RecommendationService {
    directory: Arc<dyn DirectoryStore>,
    reviews: Arc<dyn ReviewStore>,
    geocoder: Arc<dyn GeocodingProvider>,
    router: Arc<dyn RoutingProvider>,
    call_timeout: Duration,
}

impl RecommendationService {
    pub fn new(
        directory: Arc<dyn DirectoryStore>,
        reviews: Arc<dyn ReviewStore>,
        geocoder: Arc<dyn GeocodingProvider>,
        router: Arc<dyn RoutingProvider>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            directory,
            reviews,
            geocoder,
            router,
            call_timeout,
        }
    }

    pub async fn rank(
        &self,
        home_address: Option<&str>,
        limit: usize,
    ) -> AppResult<Vec<RankedCentre>> {
        let start = Instant::now();
        let home_address = home_address.map(str::trim).filter(|a| !a.is_empty());

        let centres = self.directory.list_all_centres().await?;
        let candidate_count = centres.len();

        let (home, selected) = match home_address {
            Some(address) => {
                let home = self.geocode(address).await?;
                let nearest = geo::nearest_k(centres, home, limit, Centre::coordinates);
                (Some(home), nearest)
            }
            None => (None, centres.into_iter().take(limit).collect::<Vec<_>>()),
        };

        let mut ranked = Vec::with_capacity(selected.len());
        for centre in selected {
            let reviews = self
                .reviews
                .list_reviews_for(&TargetRef::DementiaDaycare(centre.id))
                .await?;
            ranked.push(RankedCentre::new(centre, reviews));
        }

        if let Some(home) = home {
            ranked = self.attach_routes(home, ranked).await;
            sort_by_distance(&mut ranked);
        }

        tracing::info!(
            with_home = home.is_some(),
            candidates = candidate_count,
            returned = ranked.len(),
            limit = limit,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Recommendations ranked"
        );

        Ok(ranked)
    }

    /// Resolves the home address; a miss is the caller's fault, an outage is not
    async fn geocode(&self, address: &str) -> AppResult<Coordinates> {
        match timeout(self.call_timeout, self.geocoder.resolve(address)).await {
            Ok(Ok(Some(coordinates))) => Ok(coordinates),
            Ok(Ok(None)) => {
                tracing::info!(address = %address, "Home address could not be resolved");
                Err(AppError::InvalidAddress(format!(
                    "Could not find a location for address: {}",
                    address
                )))
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(AppError::ExternalApi(format!(
                "Geocoder {} timed out after {}ms",
                self.geocoder.name(),
                self.call_timeout.as_millis()
            ))),
        }
    }

    /// Looks up driving and transit routes for every candidate in parallel
    ///
    /// A failed lookup only affects its own candidate.
    async fn attach_routes(
        &self,
        home: Coordinates,
        ranked: Vec<RankedCentre>,
    ) -> Vec<RankedCentre> {
        let mut tasks = Vec::with_capacity(ranked.len());

        for candidate in &ranked {
            let router = Arc::clone(&self.router);
            let destination = candidate.centre.coordinates();
            let centre_id = candidate.centre.id;
            let call_timeout = self.call_timeout;

            let task = tokio::spawn(async move {
                let lookup = RouteLookup {
                    router: router.as_ref(),
                    origin: home,
                    destination,
                    centre_id,
                    call_timeout,
                };
                tokio::join!(
                    lookup.run(TravelMode::Driving),
                    lookup.run(TravelMode::Transit)
                )
            });
            tasks.push(task);
        }

        let mut routed = Vec::with_capacity(ranked.len());
        for (candidate, task) in ranked.into_iter().zip(tasks) {
            let (driving, transit) = match task.await {
                Ok(outcomes) => outcomes,
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        centre_id = candidate.centre.id,
                        "Route lookup task failed"
                    );
                    (RouteOutcome::Error, RouteOutcome::Error)
                }
            };
            routed.push(candidate.with_routes(driving, transit));
        }

        routed
    }
}

/// One origin/destination pair to be routed in several modes
struct RouteLookup<'a> {
    router: &'a dyn RoutingProvider,
    origin: Coordinates,
    destination: Coordinates,
    centre_id: i64,
    call_timeout: Duration,
}

impl RouteLookup<'_> {
    async fn run(&self, mode: TravelMode) -> RouteOutcome {
        let call = self
            .router
            .route_distance(self.origin, self.destination, mode);

        match timeout(self.call_timeout, call).await {
            Ok(Ok(outcome)) => {
                if outcome == RouteOutcome::NotFound {
                    tracing::debug!(centre_id = self.centre_id, mode = %mode, "No route found");
                }
                outcome
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    error = %e,
                    centre_id = self.centre_id,
                    mode = %mode,
                    provider = self.router.name(),
                    "Route lookup failed"
                );
                RouteOutcome::Error
            }
            Err(_) => {
                tracing::warn!(
                    centre_id = self.centre_id,
                    mode = %mode,
                    provider = self.router.name(),
                    timeout_ms = self.call_timeout.as_millis() as u64,
                    "Route lookup timed out"
                );
                RouteOutcome::Error
            }
        }
    }
}

/// Orders by driving distance; centres without a known distance go last
fn sort_by_distance(ranked: &mut [RankedCentre]) {
    ranked.sort_by_key(|r| (r.distance_from_home.is_none(), r.distance_from_home));
}
