use axum_helpers::JwtConfig;
use core_config::{AppInfo, FromEnv, app_info, env_or_default, server::ServerConfig};
use database::mongodb::MongoConfig;
use domain_products::ContentfulConfig;

pub use core_config::Environment;

/// Hourly, on the hour.
pub const DEFAULT_SYNC_CRON: &str = "0 0 * * * *";

/// Application configuration, composed from the shared config pieces.
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub server: ServerConfig,
    pub mongodb: MongoConfig,
    pub jwt: JwtConfig,
    pub contentful: ContentfulConfig,
    /// Six-field cron expression for the product sync job
    pub sync_cron: String,
    pub environment: Environment,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let app = app_info!();

        let mut mongodb = MongoConfig::from_env()?;
        if mongodb.app_name.is_none() {
            mongodb = mongodb.with_app_name(app.name);
        }

        Ok(Self {
            mongodb,
            server: ServerConfig::from_env()?,
            jwt: JwtConfig::from_env()?,
            contentful: ContentfulConfig::from_env()?,
            sync_cron: env_or_default("SYNC_CRON", DEFAULT_SYNC_CRON),
            app,
            environment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [(&str, Option<&str>); 6] = [
        ("MONGODB_URL", Some("mongodb://localhost:27017")),
        ("MONGODB_DATABASE", Some("catalog")),
        ("JWT_SECRET", Some("0123456789abcdef0123456789abcdef")),
        ("CONTENTFUL_SPACE_ID", Some("space")),
        ("CONTENTFUL_ACCESS_TOKEN", Some("token")),
        ("CONTENTFUL_PRODUCTS_CONTENT_TYPE", Some("product")),
    ];

    #[test]
    fn test_config_defaults() {
        temp_env::with_vars(REQUIRED, || {
            temp_env::with_vars_unset(["SYNC_CRON", "PORT", "API_PORT", "MONGODB_APP_NAME"], || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.sync_cron, DEFAULT_SYNC_CRON);
                assert_eq!(config.server.port, 8080);
                assert_eq!(config.app.name, "catalog_api");
                assert_eq!(config.mongodb.app_name.as_deref(), Some("catalog_api"));
            });
        });
    }

    #[test]
    fn test_config_requires_jwt_secret() {
        temp_env::with_vars(REQUIRED, || {
            temp_env::with_var_unset("JWT_SECRET", || {
                assert!(Config::from_env().is_err());
            });
        });
    }
}
