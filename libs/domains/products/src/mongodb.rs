//! MongoDB implementations of the product and tombstone repositories

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    bson::{self, doc, Bson, Document},
    error::{ErrorKind, WriteFailure},
    options::{FindOptions, IndexOptions},
    Collection, Database, IndexModel,
};
use tracing::instrument;

use crate::error::{ProductError, ProductResult};
use crate::models::{BrandTotal, DeletedSku, NewProduct, Product};
use crate::query::{ProductField, ProductPredicate};
use crate::repository::{DeletedSkuRepository, ProductRepository};

pub const PRODUCTS_COLLECTION: &str = "products";
pub const DELETED_PRODUCTS_COLLECTION: &str = "deleted_products";

const DUPLICATE_KEY: i32 = 11000;

pub struct MongoProductRepository {
    collection: Collection<Product>,
}

impl MongoProductRepository {
    pub fn new(db: &Database) -> Self {
        Self::with_collection(db, PRODUCTS_COLLECTION)
    }

    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        Self {
            collection: db.collection::<Product>(collection_name),
        }
    }

    /// SKU and brand lookups; SKUs repeat across syncs so neither is unique.
    pub async fn init_indexes(&self) -> ProductResult<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { ProductField::Sku.key(): 1 })
                .options(IndexOptions::builder().name("idx_sku".to_string()).build())
                .build(),
            IndexModel::builder()
                .keys(doc! { ProductField::Brand.key(): 1 })
                .options(IndexOptions::builder().name("idx_brand".to_string()).build())
                .build(),
            IndexModel::builder()
                .keys(doc! { ProductField::CreatedAt.key(): 1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_created_at".to_string())
                        .build(),
                )
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::info!("Product indexes created successfully");
        Ok(())
    }

    fn raw(&self) -> Collection<Document> {
        self.collection.clone_with_type::<Document>()
    }
}

/// Reads an aggregation count that the server may return as either width.
fn count_field(doc: &Document, key: &str) -> u64 {
    match doc.get(key) {
        Some(Bson::Int32(n)) => u64::try_from(*n).unwrap_or(0),
        Some(Bson::Int64(n)) => u64::try_from(*n).unwrap_or(0),
        Some(Bson::Double(n)) if *n >= 0.0 => *n as u64,
        _ => 0,
    }
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    #[instrument(skip(self, products), fields(count = products.len()))]
    async fn insert_many(&self, products: Vec<NewProduct>) -> ProductResult<u64> {
        if products.is_empty() {
            return Ok(0);
        }

        let now = bson::DateTime::now();
        let rows: Vec<Product> = products
            .into_iter()
            .map(|p| Product::from_new(p, now))
            .collect();

        let result = self.collection.insert_many(rows).await?;
        let inserted = result.inserted_ids.len() as u64;
        tracing::info!(inserted, "Products inserted");
        Ok(inserted)
    }

    #[instrument(skip(self))]
    async fn count(&self, predicate: &ProductPredicate) -> ProductResult<u64> {
        let count = self
            .collection
            .count_documents(predicate.to_document())
            .await?;
        Ok(count)
    }

    #[instrument(skip(self))]
    async fn find_page(
        &self,
        predicate: &ProductPredicate,
        skip: u64,
        limit: u64,
    ) -> ProductResult<Vec<Product>> {
        let limit = i64::try_from(limit)
            .map_err(|_| ProductError::Validation("limit is out of range".to_string()))?;
        let options = FindOptions::builder()
            .skip(skip)
            .limit(limit)
            .sort(doc! { "_id": 1 })
            .build();

        let cursor = self
            .collection
            .find(predicate.to_document())
            .with_options(options)
            .await?;
        let products: Vec<Product> = cursor.try_collect().await?;
        Ok(products)
    }

    #[instrument(skip(self))]
    async fn exists_by_sku(&self, sku: &str) -> ProductResult<bool> {
        let found = self
            .raw()
            .find_one(doc! { ProductField::Sku.key(): sku })
            .projection(doc! { "_id": 1 })
            .await?;
        Ok(found.is_some())
    }

    #[instrument(skip(self))]
    async fn count_distinct_skus(&self) -> ProductResult<u64> {
        let pipeline = vec![
            doc! { "$group": { "_id": format!("${}", ProductField::Sku.key()) } },
            doc! { "$count": "uniqueSkusCount" },
        ];

        let mut cursor = self.collection.aggregate(pipeline).await?;
        let count = match cursor.try_next().await? {
            Some(doc) => count_field(&doc, "uniqueSkusCount"),
            None => 0,
        };
        Ok(count)
    }

    #[instrument(skip(self))]
    async fn count_by_brand(&self) -> ProductResult<Vec<BrandTotal>> {
        let pipeline = vec![
            doc! {
                "$group": {
                    "_id": format!("${}", ProductField::Brand.key()),
                    "totalProducts": { "$sum": 1 },
                }
            },
            doc! { "$sort": { "_id": 1 } },
        ];

        let cursor = self.collection.aggregate(pipeline).await?;
        let groups: Vec<Document> = cursor.try_collect().await?;

        Ok(groups
            .iter()
            .map(|group| BrandTotal {
                product_brand: group.get_str("_id").unwrap_or_default().to_string(),
                total_products: count_field(group, "totalProducts"),
            })
            .collect())
    }
}

pub struct MongoDeletedSkuRepository {
    collection: Collection<DeletedSku>,
}

impl MongoDeletedSkuRepository {
    pub fn new(db: &Database) -> Self {
        Self::with_collection(db, DELETED_PRODUCTS_COLLECTION)
    }

    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        Self {
            collection: db.collection::<DeletedSku>(collection_name),
        }
    }

    /// The unique SKU index is what makes a second tombstone impossible.
    pub async fn init_indexes(&self) -> ProductResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { ProductField::Sku.key(): 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("idx_sku_unique".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(index).await?;
        tracing::info!("Deleted product indexes created successfully");
        Ok(())
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    )
}

#[async_trait]
impl DeletedSkuRepository for MongoDeletedSkuRepository {
    #[instrument(skip(self))]
    async fn find_all(&self) -> ProductResult<Vec<DeletedSku>> {
        let cursor = self.collection.find(doc! {}).await?;
        let deleted: Vec<DeletedSku> = cursor.try_collect().await?;
        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn find_by_sku(&self, sku: &str) -> ProductResult<Option<DeletedSku>> {
        let found = self
            .collection
            .find_one(doc! { ProductField::Sku.key(): sku })
            .await?;
        Ok(found)
    }

    #[instrument(skip(self))]
    async fn insert(&self, sku: &str) -> ProductResult<DeletedSku> {
        let mut tombstone = DeletedSku::new(sku);

        match self.collection.insert_one(&tombstone).await {
            Ok(result) => {
                tombstone.id = result.inserted_id.as_object_id();
                tracing::info!(sku, "Product soft-deleted");
                Ok(tombstone)
            }
            Err(e) if is_duplicate_key(&e) => Err(ProductError::AlreadyDeleted {
                sku: sku.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}
