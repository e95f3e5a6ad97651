use super::config::JwtConfig;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

/// Token handed out by the sign-in route.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub access_token: String,
    /// Always `Bearer`
    pub token_type: String,
    /// Seconds until expiry
    pub expires_in: i64,
}

/// Stateless HS256 issuer and verifier. Cloning shares the keys.
#[derive(Clone)]
pub struct JwtAuth {
    keys: Arc<Keys>,
    ttl_secs: i64,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtAuth {
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.secret.as_bytes();
        tracing::info!(ttl_secs = config.ttl_secs, "JWT auth initialized");
        Self {
            keys: Arc::new(Keys {
                encoding: EncodingKey::from_secret(secret),
                decoding: DecodingKey::from_secret(secret),
            }),
            ttl_secs: config.ttl_secs,
        }
    }

    pub fn issue_token(&self, subject: &str) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: subject.to_string(),
            exp: (now + Duration::seconds(self.ttl_secs)).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let access_token = encode(&Header::new(Algorithm::HS256), &claims, &self.keys.encoding)?;

        Ok(IssuedToken {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.ttl_secs,
        })
    }

    /// Check signature and expiry, returning the claims.
    pub fn verify_token(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let data = decode::<JwtClaims>(
            token,
            &self.keys.decoding,
            &Validation::new(Algorithm::HS256),
        )?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth(secret: &str, ttl: i64) -> JwtAuth {
        JwtAuth::new(&JwtConfig::new(secret).unwrap().with_ttl_secs(ttl))
    }

    const SECRET: &str = "unit-test-secret-that-is-long-enough";

    #[test]
    fn test_issue_then_verify() {
        let auth = auth(SECRET, 300);
        let issued = auth.issue_token("reports").unwrap();
        assert_eq!(issued.token_type, "Bearer");
        assert_eq!(issued.expires_in, 300);

        let claims = auth.verify_token(&issued.access_token).unwrap();
        assert_eq!(claims.sub, "reports");
        assert_eq!(claims.exp - claims.iat, 300);
    }

    #[test]
    fn test_verify_rejects_foreign_signature() {
        let issued = auth(SECRET, 300).issue_token("reports").unwrap();
        let other = auth("another-secret-that-is-also-long-enough", 300);
        assert!(other.verify_token(&issued.access_token).is_err());
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        // Past the default 60s leeway.
        let issued = auth(SECRET, -120).issue_token("reports").unwrap();
        assert!(auth(SECRET, 300).verify_token(&issued.access_token).is_err());
    }

    #[test]
    fn test_issued_token_serializes_camel_case() {
        let issued = auth(SECRET, 60).issue_token("reports").unwrap();
        let json = serde_json::to_value(&issued).unwrap();
        assert!(json.get("accessToken").is_some());
        assert_eq!(json["tokenType"], "Bearer");
        assert_eq!(json["expiresIn"], 60);
    }
}
