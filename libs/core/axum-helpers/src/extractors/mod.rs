//! Request extractors that reject with [`AppError`](crate::errors::AppError).

pub mod validated_query;

pub use validated_query::ValidatedQuery;
