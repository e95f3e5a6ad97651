//! Error types for the catalog domain

use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;

use crate::source::SourceError;

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("Product not found.")]
    NotFound { sku: String },

    #[error("Product already deleted.")]
    AlreadyDeleted { sku: String },

    #[error("{0}")]
    Validation(String),

    #[error("Product source request failed: {0}")]
    Source(#[from] SourceError),

    #[error("Database error: {0}")]
    Database(String),

    /// Message is safe to show to callers; the cause was logged where it was raised.
    #[error("{0}")]
    Internal(String),
}

pub type ProductResult<T> = Result<T, ProductError>;

impl ProductError {
    /// Errors that describe the request rather than a failure of the service.
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            ProductError::NotFound { .. }
                | ProductError::AlreadyDeleted { .. }
                | ProductError::Validation(_)
        )
    }
}

/// Keeps domain errors and replaces anything else with `Internal(message)`,
/// logging the original under `operation`.
pub(crate) fn internal_unless_domain(
    operation: &'static str,
    message: &'static str,
) -> impl FnOnce(ProductError) -> ProductError {
    move |err| {
        if err.is_domain() {
            err
        } else {
            tracing::error!(operation, error = %err, "Unexpected failure");
            ProductError::Internal(message.to_string())
        }
    }
}

impl From<ProductError> for AppError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::NotFound { .. } => AppError::NotFound(err.to_string()),
            ProductError::AlreadyDeleted { .. } => AppError::Conflict(err.to_string()),
            ProductError::Validation(msg) => AppError::BadRequest(msg),
            ProductError::Source(source) => AppError::BadGateway {
                message: "Failed to fetch products from the content source".to_string(),
                details: serde_json::to_value(&source).ok(),
            },
            ProductError::Database(msg) => {
                tracing::error!(error = %msg, "Database failure");
                AppError::InternalServerError("A database error occurred.".to_string())
            }
            ProductError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for ProductError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

impl From<mongodb::error::Error> for ProductError {
    fn from(err: mongodb::error::Error) -> Self {
        ProductError::Database(err.to_string())
    }
}
