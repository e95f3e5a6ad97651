//! Query-string extractor with `validator` rules applied after decoding.

use crate::errors::AppError;
use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// Like [`Query`], but runs [`Validate::validate`] on the decoded value.
///
/// A malformed query string rejects with `INVALID_QUERY`; a rule violation
/// rejects with `VALIDATION_ERROR` and the field errors in `details`.
///
/// ```ignore
/// #[derive(Deserialize, Validate)]
/// struct Page {
///     skip: u64,
///     #[validate(range(min = 1, max = 5))]
///     limit: u64,
/// }
///
/// async fn list(ValidatedQuery(page): ValidatedQuery<Page>) { /* ... */ }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        value.validate()?;
        Ok(ValidatedQuery(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
        routing::get,
    };
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Deserialize, Validate)]
    struct Page {
        skip: u64,
        #[validate(range(min = 1, max = 5))]
        limit: u64,
    }

    fn app() -> Router {
        Router::new().route(
            "/products",
            get(|ValidatedQuery(page): ValidatedQuery<Page>| async move {
                format!("{}:{}", page.skip, page.limit)
            }),
        )
    }

    async fn status_of(uri: &str) -> StatusCode {
        app()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_valid_query_passes() {
        assert_eq!(status_of("/products?skip=0&limit=5").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_rule_violation_is_bad_request() {
        assert_eq!(status_of("/products?skip=0&limit=6").await, StatusCode::BAD_REQUEST);
        assert_eq!(status_of("/products?skip=0&limit=0").await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_query_is_bad_request() {
        assert_eq!(status_of("/products?skip=-1&limit=2").await, StatusCode::BAD_REQUEST);
        assert_eq!(status_of("/products?limit=2").await, StatusCode::BAD_REQUEST);
    }
}
