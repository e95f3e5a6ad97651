use async_trait::async_trait;

use crate::error::ProductResult;
use crate::models::{BrandTotal, DeletedSku, NewProduct, Product};
use crate::query::ProductPredicate;

/// Persistence for synced product rows.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Append rows stamped with the current time. Returns the number stored;
    /// an empty input stores nothing and is not an error.
    async fn insert_many(&self, products: Vec<NewProduct>) -> ProductResult<u64>;

    async fn count(&self, predicate: &ProductPredicate) -> ProductResult<u64>;

    /// One page of matching rows in insertion order.
    async fn find_page(
        &self,
        predicate: &ProductPredicate,
        skip: u64,
        limit: u64,
    ) -> ProductResult<Vec<Product>>;

    async fn exists_by_sku(&self, sku: &str) -> ProductResult<bool>;

    /// Number of distinct SKUs across all rows.
    async fn count_distinct_skus(&self) -> ProductResult<u64>;

    /// Row count per brand, sorted by brand.
    async fn count_by_brand(&self) -> ProductResult<Vec<BrandTotal>>;
}

/// Persistence for SKU tombstones.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeletedSkuRepository: Send + Sync {
    async fn find_all(&self) -> ProductResult<Vec<DeletedSku>>;

    async fn find_by_sku(&self, sku: &str) -> ProductResult<Option<DeletedSku>>;

    /// Fails with `AlreadyDeleted` when the SKU already has a tombstone.
    async fn insert(&self, sku: &str) -> ProductResult<DeletedSku>;
}
