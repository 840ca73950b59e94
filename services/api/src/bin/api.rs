//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, LocalBlobStore, MlServiceAdapter},
    config::Config,
    error::ApiError,
    web::{build_router, state::{Adapters, AppState}},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.ml_timeout_secs))
        .build()
        .map_err(|e| ApiError::Internal(format!("Failed to build HTTP client: {}", e)))?;
    let ml_adapter = Arc::new(MlServiceAdapter::new(http_client, config.ml_service_url.clone()));
    info!("Using ML service at {}", config.ml_service_url);

    tokio::fs::create_dir_all(&config.storage_root).await?;
    let blob_store = Arc::new(LocalBlobStore::new(
        config.storage_root.clone(),
        config.storage_bucket.clone(),
        config.public_base_url.clone(),
    ));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(
        config.clone(),
        Adapters {
            db: db_adapter,
            generator: ml_adapter.clone(),
            scorer: ml_adapter.clone(),
            parser: ml_adapter.clone(),
            analyzer: ml_adapter,
            blobs: blob_store,
        },
    ));

    // --- 5. Create the Web Router ---
    let app = build_router(app_state)?;

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
