use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use sqlx::{Pool, Postgres, postgres::PgPoolOptions};
use tokio::net::TcpListener;

use crate::{
    api,
    cache::{CacheStore, MemoryCache, PostgresCache},
    config::{CacheSettings, ProviderSettings, Settings},
    provider::{GeoProvider, GoogleGeocoder},
    scheduler::Scheduler,
    services::GeocodeService,
    tasks,
};

mod diag;

pub use diag::{Diag, DiagSnapshot};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct AppState {
    pub geocoder: Arc<GeocodeService>,
    pub diag: Arc<Diag>,
}

impl AppState {
    /// Wires a geocode service around the given collaborators, counting into a fresh [`Diag`]
    pub fn new(
        cache: Arc<dyn CacheStore>,
        provider: Arc<dyn GeoProvider>,
        provider_timeout: Duration,
        coalesce_misses: bool,
    ) -> Self {
        let diag = Arc::new(Diag::new());
        let geocoder = GeocodeService::new(cache, provider)
            .with_observer(diag.clone())
            .with_provider_timeout(provider_timeout)
            .with_miss_coalescing(coalesce_misses);

        Self {
            geocoder: Arc::new(geocoder),
            diag,
        }
    }
}

pub async fn connect_to_db(database_url: &str) -> Result<Pool<Postgres>> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;

    // Run SQL migrations
    sqlx::migrate!()
        .run(&pool)
        .await
        .context("SQL migrations failed")?;

    Ok(pool)
}

pub fn build_provider(settings: &ProviderSettings) -> Result<GoogleGeocoder> {
    GoogleGeocoder::new(
        settings.base_url.clone(),
        settings.api_key.clone(),
        settings.language.clone(),
        settings.timeout,
    )
    .context("Failed to build geocoding client")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

pub async fn run(config: Settings) -> Result<()> {
    let mut scheduler = Scheduler::new();

    let cache: Arc<dyn CacheStore> = match &config.cache {
        CacheSettings::Memory { max_capacity } => {
            tracing::info!(max_capacity, "Using in-memory cache");
            Arc::new(MemoryCache::new(*max_capacity))
        }
        CacheSettings::Postgres { database_url } => {
            let pool = connect_to_db(database_url.as_str()).await?;
            tracing::info!("Using postgres cache");

            let cache = PostgresCache::new(pool);
            scheduler.spawn_task(
                Scheduler::DAY,
                "purge_expired",
                cache.clone(),
                tasks::purge_expired_task,
            );
            Arc::new(cache)
        }
    };

    let provider = Arc::new(build_provider(&config.provider)?);
    let state = AppState::new(
        cache,
        provider,
        config.provider.timeout,
        config.coalesce_misses,
    );

    scheduler.spawn_task(
        config.diag_interval,
        "print_diagnostics",
        state.diag.clone(),
        tasks::print_diagnostics_task,
    );

    let router = api::build_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("App running on {addr}");

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    scheduler.shutdown(SHUTDOWN_TIMEOUT).await;

    served?;
    Ok(())
}
