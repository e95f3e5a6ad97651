use axum_helpers::server::{create_production_app, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_products::{
    ContentfulClient, MongoDeletedSkuRepository, MongoProductRepository, ProductService,
};
use std::time::Duration;
use tracing::{error, info};

mod api;
mod config;
mod jobs;
mod openapi;
mod state;

use axum_helpers::JwtAuth;
use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;

    init_tracing(&config.environment);

    info!(database = %config.mongodb.database, "Connecting to MongoDB");
    let mongo_client =
        database::mongodb::connect_from_config_with_retry(&config.mongodb, None).await?;
    let db = mongo_client.database(&config.mongodb.database);
    info!(database = %config.mongodb.database, "Connected to MongoDB");

    let products = MongoProductRepository::new(&db);
    let deleted = MongoDeletedSkuRepository::new(&db);
    products
        .init_indexes()
        .await
        .map_err(|e| eyre::eyre!("Failed to create product indexes: {e}"))?;
    deleted
        .init_indexes()
        .await
        .map_err(|e| eyre::eyre!("Failed to create deleted product indexes: {e}"))?;

    let source = ContentfulClient::new(config.contentful.clone())
        .map_err(|e| eyre::eyre!("Failed to build Contentful client: {e}"))?;

    let service = ProductService::new(products, deleted, source);
    let auth = JwtAuth::new(&config.jwt);

    let mut scheduler = jobs::start_sync_scheduler(service.clone(), &config.sync_cron).await?;

    let state = AppState {
        config,
        mongo_client,
        db,
        service,
        auth,
    };

    let router = axum_helpers::create_router::<openapi::ApiDoc>(api::routes(&state))?;
    let app = router
        .merge(health_router(state.config.app.clone()))
        .merge(api::health::router(state.db.clone()));

    info!("Starting Catalog API with graceful shutdown (30s timeout)");

    let mongo_client = state.mongo_client.clone();
    create_production_app(app, &state.config.server, Duration::from_secs(30), async move {
        info!("Shutting down: stopping sync scheduler");
        if let Err(e) = scheduler.shutdown().await {
            error!(error = %e, "Sync scheduler did not stop cleanly");
        }
        mongo_client.shutdown().await;
        info!("MongoDB connections closed");
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {e}"))?;

    info!("Catalog API shutdown complete");
    Ok(())
}
