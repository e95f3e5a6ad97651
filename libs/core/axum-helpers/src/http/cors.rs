use axum::http::{HeaderValue, Method, header};
use core_config::ConfigError;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

pub const CORS_ENV: &str = "CORS_ALLOWED_ORIGIN";

/// Parses a comma-separated origin list such as
/// `http://localhost:3000, https://shop.example.com`.
pub fn parse_allowed_origins(raw: &str) -> Result<Vec<HeaderValue>, ConfigError> {
    let origins = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<HeaderValue>().map_err(|e| ConfigError::ParseError {
                key: CORS_ENV.to_string(),
                details: format!("{s}: {e}"),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if origins.is_empty() {
        return Err(ConfigError::Invalid {
            key: CORS_ENV.to_string(),
            details: "no origins listed".to_string(),
        });
    }
    Ok(origins)
}

/// CORS for browser clients of the API: the listed origins, the verbs the
/// API serves, and the headers bearer auth needs.
pub fn create_cors_layer(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .max_age(Duration::from_secs(3600))
}

/// Layer for `CORS_ALLOWED_ORIGIN`, or `None` when the variable is unset.
pub fn cors_layer_from_env() -> Result<Option<CorsLayer>, ConfigError> {
    match std::env::var(CORS_ENV) {
        Ok(raw) => Ok(Some(create_cors_layer(parse_allowed_origins(&raw)?))),
        Err(_) => Ok(None),
    }
}
