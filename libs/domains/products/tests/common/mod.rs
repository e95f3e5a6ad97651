//! In-memory stores and a canned source for driving the routers without MongoDB.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum_helpers::{JwtAuth, JwtConfig};
use domain_products::models::BrandTotal;
use domain_products::{
    handlers, DeletedSku, DeletedSkuRepository, NewProduct, Product, ProductError,
    ProductPredicate, ProductRepository, ProductResult, ProductService, ProductSource,
    SourceError, SourceFields, SourceItem,
};
use http_body_util::BodyExt;
use mongodb::bson;

pub const TEST_SECRET: &str = "test-secret-that-is-at-least-32-characters";

#[derive(Clone, Default)]
pub struct MemoryProducts {
    rows: Arc<Mutex<Vec<Product>>>,
}

impl MemoryProducts {
    pub fn rows(&self) -> Vec<Product> {
        self.rows.lock().unwrap().clone()
    }

    pub fn push(&self, product: Product) {
        self.rows.lock().unwrap().push(product);
    }
}

#[async_trait]
impl ProductRepository for MemoryProducts {
    async fn insert_many(&self, products: Vec<NewProduct>) -> ProductResult<u64> {
        let now = bson::DateTime::now();
        let mut rows = self.rows.lock().unwrap();
        let count = products.len() as u64;
        rows.extend(products.into_iter().map(|p| Product::from_new(p, now)));
        Ok(count)
    }

    async fn count(&self, predicate: &ProductPredicate) -> ProductResult<u64> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().filter(|p| predicate.matches(p)).count() as u64)
    }

    async fn find_page(
        &self,
        predicate: &ProductPredicate,
        skip: u64,
        limit: u64,
    ) -> ProductResult<Vec<Product>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|p| predicate.matches(p))
            .skip(skip as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn exists_by_sku(&self, sku: &str) -> ProductResult<bool> {
        Ok(self.rows.lock().unwrap().iter().any(|p| p.product_sku == sku))
    }

    async fn count_distinct_skus(&self) -> ProductResult<u64> {
        let rows = self.rows.lock().unwrap();
        let mut skus: Vec<&str> = rows.iter().map(|p| p.product_sku.as_str()).collect();
        skus.sort_unstable();
        skus.dedup();
        Ok(skus.len() as u64)
    }

    async fn count_by_brand(&self) -> ProductResult<Vec<BrandTotal>> {
        let rows = self.rows.lock().unwrap();
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for row in rows.iter() {
            *counts.entry(row.product_brand.clone()).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(product_brand, total_products)| BrandTotal {
                product_brand,
                total_products,
            })
            .collect())
    }
}

#[derive(Clone, Default)]
pub struct MemoryDeleted {
    tombstones: Arc<Mutex<Vec<DeletedSku>>>,
}

#[async_trait]
impl DeletedSkuRepository for MemoryDeleted {
    async fn find_all(&self) -> ProductResult<Vec<DeletedSku>> {
        Ok(self.tombstones.lock().unwrap().clone())
    }

    async fn find_by_sku(&self, sku: &str) -> ProductResult<Option<DeletedSku>> {
        let tombstones = self.tombstones.lock().unwrap();
        Ok(tombstones.iter().find(|d| d.product_sku == sku).cloned())
    }

    async fn insert(&self, sku: &str) -> ProductResult<DeletedSku> {
        let mut tombstones = self.tombstones.lock().unwrap();
        if tombstones.iter().any(|d| d.product_sku == sku) {
            return Err(ProductError::AlreadyDeleted {
                sku: sku.to_string(),
            });
        }
        let tombstone = DeletedSku::new(sku);
        tombstones.push(tombstone.clone());
        Ok(tombstone)
    }
}

/// Always answers with the same entries, or the same error.
#[derive(Clone)]
pub struct StaticSource {
    result: Result<Vec<SourceItem>, SourceError>,
}

impl StaticSource {
    pub fn items(items: Vec<SourceItem>) -> Self {
        Self { result: Ok(items) }
    }

    pub fn failing(error: SourceError) -> Self {
        Self { result: Err(error) }
    }
}

#[async_trait]
impl ProductSource for StaticSource {
    async fn fetch_products(&self) -> Result<Vec<SourceItem>, SourceError> {
        self.result.clone()
    }
}

pub fn source_item(sku: &str, brand: &str, price: Option<f64>) -> SourceItem {
    SourceItem {
        fields: SourceFields {
            sku: Some(sku.to_string()),
            name: Some(format!("{sku} name")),
            brand: Some(brand.to_string()),
            price,
            currency: Some("USD".to_string()),
            ..Default::default()
        },
    }
}

pub fn auth() -> JwtAuth {
    JwtAuth::new(&JwtConfig::new(TEST_SECRET).unwrap())
}

pub fn bearer() -> String {
    format!("Bearer {}", auth().issue_token("tests").unwrap().access_token)
}

pub struct TestApp {
    pub products: MemoryProducts,
    pub deleted: MemoryDeleted,
    pub router: axum::Router,
}

pub fn app(source: StaticSource) -> TestApp {
    let products = MemoryProducts::default();
    let deleted = MemoryDeleted::default();
    let service = ProductService::new(products.clone(), deleted.clone(), source);
    TestApp {
        products,
        deleted,
        router: handlers::router(service, auth()),
    }
}

pub fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn authorized(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", bearer())
        .body(Body::empty())
        .unwrap()
}

pub async fn json_body<T: serde::de::DeserializeOwned>(body: Body) -> T {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
