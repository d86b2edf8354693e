use std::{path::Path, sync::Arc};

use carecompass_api::{
    config::Config,
    db::{self, PgDirectoryStore},
    routes::{create_router, AppState},
    services::{seed, GoogleMapsRouter, OneMapGeocoder, RecommendationService},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("carecompass_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_url).await?;
    sqlx::migrate!().run(&pool).await?;
    tracing::info!("Database migrations applied");

    let redis_client = db::create_redis_client(&config.redis_url)?;
    let (cache, cache_writer) = db::Cache::new(redis_client).await;

    let store = Arc::new(PgDirectoryStore::new(pool));
    if let Some(path) = &config.seed_file {
        seed::seed_from_file(store.as_ref(), Path::new(path)).await?;
    }

    let geocoder = Arc::new(OneMapGeocoder::new(cache, config.onemap_api_url.clone()));
    let router = Arc::new(GoogleMapsRouter::new(
        config.google_maps_api_key.clone(),
        config.google_maps_api_url.clone(),
    ));

    let recommendations = RecommendationService::new(
        store.clone(),
        store,
        geocoder,
        router,
        config.external_call_timeout(),
    );

    let state = Arc::new(AppState::new(recommendations, config.cors_origins.clone()));
    let app = create_router(state);

    let address = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cache_writer.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
