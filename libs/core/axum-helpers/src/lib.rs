//! # Axum Helpers
//!
//! Shared building blocks for the HTTP services in this workspace.
//!
//! - [`auth`]: stateless JWT issuing and the bearer-token middleware
//! - [`errors`]: [`AppError`] and the JSON error body every route returns
//! - [`extractors`]: [`ValidatedQuery`]
//! - [`http`]: CORS and security headers
//! - [`server`]: router assembly with OpenAPI UIs, health/readiness, shutdown
//!
//! ```ignore
//! use axum_helpers::server::{create_production_app, create_router, health_router};
//! use core_config::app_info;
//!
//! let app = create_router::<ApiDoc>(api_routes)?.merge(health_router(app_info!()));
//! create_production_app(app, &server_config, Duration::from_secs(30), async {}).await?;
//! ```

pub mod auth;
pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

pub use auth::{IssuedToken, JwtAuth, JwtClaims, JwtConfig, jwt_auth_middleware};
pub use errors::{AppError, ErrorCode, ErrorResponse};
pub use extractors::ValidatedQuery;
pub use server::{
    HealthCheckFuture, HealthResponse, ReadyResponse, ShutdownCoordinator, create_production_app,
    create_router, health_router, run_health_checks, shutdown_signal,
};
