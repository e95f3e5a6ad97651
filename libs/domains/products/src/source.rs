//! Client for the external content API the catalog is synced from.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use core_config::{env_or_default, env_parse_or, env_required, ConfigError, FromEnv};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::models::NewProduct;

/// Entry fields as the content API returns them. Everything is optional
/// because editors can leave any field blank.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SourceFields {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub category: Option<String>,
    pub color: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub stock: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SourceItem {
    #[serde(default)]
    pub fields: SourceFields,
}

#[derive(Debug, Deserialize)]
struct EntriesResponse {
    items: Option<Vec<SourceItem>>,
}

/// Why a source call failed.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceError {
    /// The server answered with a non-success status.
    #[error("source responded with status {status}")]
    Response { status: u16, body: Value },

    /// The request went out but no response came back.
    #[error("no response from {method} {url}: {message}")]
    Request {
        method: String,
        url: String,
        message: String,
    },

    /// The request could not be built, or a success body could not be read.
    #[error("source request setup failed: {message}")]
    Setup { status: Option<u16>, message: String },
}

/// Where products come from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductSource: Send + Sync {
    async fn fetch_products(&self) -> Result<Vec<SourceItem>, SourceError>;
}

/// A source item that cannot become a product.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidItem {
    #[error("missing required field `{0}`")]
    Missing(&'static str),
    #[error("field `{0}` must be a non-negative number")]
    Negative(&'static str),
}

impl TryFrom<SourceFields> for NewProduct {
    type Error = InvalidItem;

    fn try_from(fields: SourceFields) -> Result<Self, Self::Error> {
        let product_price = fields.price.ok_or(InvalidItem::Missing("price"))?;
        if product_price < 0.0 || !product_price.is_finite() {
            return Err(InvalidItem::Negative("price"));
        }
        if fields.stock.is_some_and(|s| s < 0) {
            return Err(InvalidItem::Negative("stock"));
        }

        Ok(NewProduct {
            product_sku: fields.sku.ok_or(InvalidItem::Missing("sku"))?,
            product_name: fields.name.ok_or(InvalidItem::Missing("name"))?,
            product_brand: fields.brand.ok_or(InvalidItem::Missing("brand"))?,
            product_model: fields.model,
            product_category: fields.category,
            product_color: fields.color,
            product_price,
            product_currency: fields.currency,
            product_stock: fields.stock,
        })
    }
}

#[derive(Clone)]
pub struct ContentfulConfig {
    /// Defaults to the public delivery API
    pub base_url: String,
    pub space_id: String,
    pub environment: String,
    pub access_token: String,
    pub content_type: String,
    pub timeout_secs: u64,
}

impl fmt::Debug for ContentfulConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentfulConfig")
            .field("base_url", &self.base_url)
            .field("space_id", &self.space_id)
            .field("environment", &self.environment)
            .field("access_token", &"<redacted>")
            .field("content_type", &self.content_type)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl FromEnv for ContentfulConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: env_or_default("CONTENTFUL_URL", "https://cdn.contentful.com"),
            space_id: env_required("CONTENTFUL_SPACE_ID")?,
            environment: env_or_default("CONTENTFUL_ENVIRONMENT", "master"),
            access_token: env_required("CONTENTFUL_ACCESS_TOKEN")?,
            content_type: env_required("CONTENTFUL_PRODUCTS_CONTENT_TYPE")?,
            timeout_secs: env_parse_or("CONTENTFUL_TIMEOUT_SECS", 30)?,
        })
    }
}

/// Reads product entries from a Contentful space.
pub struct ContentfulClient {
    config: ContentfulConfig,
    client: Client,
}

impl ContentfulClient {
    pub fn new(config: ContentfulConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SourceError::Setup {
                status: None,
                message: e.to_string(),
            })?;
        Ok(Self { config, client })
    }

    /// Entries URL without the query string, safe to log.
    pub fn entries_url(&self) -> String {
        format!(
            "{}/spaces/{}/environments/{}/entries",
            self.config.base_url.trim_end_matches('/'),
            self.config.space_id,
            self.config.environment
        )
    }
}

fn send_error(err: reqwest::Error, url: &str) -> SourceError {
    let is_builder = err.is_builder();
    let message = err.without_url().to_string();
    if is_builder {
        SourceError::Setup {
            status: None,
            message,
        }
    } else {
        SourceError::Request {
            method: "GET".to_string(),
            url: url.to_string(),
            message,
        }
    }
}

#[async_trait]
impl ProductSource for ContentfulClient {
    #[instrument(skip(self), fields(space = %self.config.space_id, content_type = %self.config.content_type))]
    async fn fetch_products(&self) -> Result<Vec<SourceItem>, SourceError> {
        let url = self.entries_url();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("access_token", self.config.access_token.as_str()),
                ("content_type", self.config.content_type.as_str()),
            ])
            .send()
            .await
            .map_err(|e| send_error(e, &url))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
            warn!(status = status.as_u16(), "Content source rejected the request");
            return Err(SourceError::Response {
                status: status.as_u16(),
                body,
            });
        }

        let entries: EntriesResponse =
            response.json().await.map_err(|e| SourceError::Setup {
                status: Some(status.as_u16()),
                message: e.without_url().to_string(),
            })?;

        let items = entries.items.unwrap_or_default();
        debug!(count = items.len(), "Fetched source entries");
        Ok(items)
    }
}
