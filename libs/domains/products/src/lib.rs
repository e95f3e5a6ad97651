//! Products Domain
//!
//! Keeps a MongoDB copy of the product entries published in a Contentful
//! space, lets callers query it, soft-delete SKUs and pull reports.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← public + bearer-protected routes
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐      ┌─────────────┐
//! │   Service   │ ───► │   Source    │  ← Contentful entries API
//! └──────┬──────┘      └─────────────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← products + deleted_products (traits + MongoDB)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Query/Models│  ← typed predicates, documents, DTOs
//! └─────────────┘
//! ```
//!
//! A soft delete writes a tombstone for the SKU. The product rows stay, but
//! every query, report and later sync filters the SKU out.
//!
//! # Usage
//!
//! ```rust,no_run
//! use axum_helpers::{JwtAuth, JwtConfig};
//! use core_config::FromEnv;
//! use domain_products::{
//!     handlers, ContentfulClient, ContentfulConfig, MongoDeletedSkuRepository,
//!     MongoProductRepository, ProductService,
//! };
//!
//! # async fn example(db: mongodb::Database) -> Result<(), Box<dyn std::error::Error>> {
//! let products = MongoProductRepository::new(&db);
//! let deleted = MongoDeletedSkuRepository::new(&db);
//! let source = ContentfulClient::new(ContentfulConfig::from_env()?)?;
//!
//! let service = ProductService::new(products, deleted, source);
//! let auth = JwtAuth::new(&JwtConfig::from_env()?);
//! let router = handlers::router(service, auth);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handlers;
pub mod models;
pub mod mongodb;
pub mod query;
pub mod repository;
pub mod service;
pub mod source;

pub use error::{ProductError, ProductResult};
pub use handlers::ApiDoc;
pub use models::{
    DeletedSku, NewProduct, NonDeletedReportQuery, Product, ProductPage, ProductQuery,
    ProductView, SyncSummary, MAX_PAGE_LIMIT, MAX_SKIP,
};
pub use self::mongodb::{MongoDeletedSkuRepository, MongoProductRepository};
pub use query::{Clause, ProductField, ProductPredicate, Scalar};
pub use repository::{DeletedSkuRepository, ProductRepository};
pub use service::ProductService;
pub use source::{
    ContentfulClient, ContentfulConfig, ProductSource, SourceError, SourceFields, SourceItem,
};
