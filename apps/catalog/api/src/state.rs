//! Shared application state.

use axum_helpers::JwtAuth;
use domain_products::{
    ContentfulClient, MongoDeletedSkuRepository, MongoProductRepository, ProductService,
};
use mongodb::{Client, Database};

/// The product service wired to its production backends.
pub type CatalogService =
    ProductService<MongoProductRepository, MongoDeletedSkuRepository, ContentfulClient>;

/// Cloned into each router; every field is a cheap handle.
#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    /// Kept so shutdown can drop the connection pool explicitly
    pub mongo_client: Client,
    pub db: Database,
    pub service: CatalogService,
    pub auth: JwtAuth,
}
