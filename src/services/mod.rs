pub mod directory;
pub mod geo;
pub mod providers;
pub mod recommendations;
pub mod seed;

pub use directory::{DirectoryStore, DirectoryWriter, InMemoryDirectory, ReviewStore};
pub use providers::{GeocodingProvider, GoogleMapsRouter, OneMapGeocoder, RoutingProvider};
pub use recommendations::RecommendationService;
