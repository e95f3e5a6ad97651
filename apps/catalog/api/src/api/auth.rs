//! Token issuing for the bearer-protected report routes

use axum::{Json, Router, extract::State, routing::post};
use axum_helpers::{AppError, IssuedToken, JwtAuth};

/// Subject written into every issued token.
const TOKEN_SUBJECT: &str = "internal";

pub fn router(auth: JwtAuth) -> Router {
    Router::new()
        .route("/auth/sign-in", post(sign_in))
        .with_state(auth)
}

/// Issue a bearer token for the report endpoints
#[utoipa::path(
    post,
    path = "/api/auth/sign-in",
    tag = "auth",
    responses(
        (status = 200, description = "Token issued", body = IssuedToken),
        (status = 500, description = "Token could not be signed", body = axum_helpers::ErrorResponse)
    )
)]
pub async fn sign_in(State(auth): State<JwtAuth>) -> Result<Json<IssuedToken>, AppError> {
    let token = auth.issue_token(TOKEN_SUBJECT).map_err(|e| {
        tracing::error!(error = %e, "Failed to issue token");
        AppError::InternalServerError("An error occurred while signing in.".to_string())
    })?;
    Ok(Json(token))
}
