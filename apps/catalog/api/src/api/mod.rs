//! HTTP routes for the catalog API.

pub mod auth;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Everything served under `/api`.
///
/// Nested under `/api` by `axum_helpers::create_router`.
pub fn routes(state: &AppState) -> Router {
    Router::new()
        .merge(domain_products::handlers::router(
            state.service.clone(),
            state.auth.clone(),
        ))
        .merge(auth::router(state.auth.clone()))
}
