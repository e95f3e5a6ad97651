use chrono::{DateTime, Utc};
use mongodb::bson::{self, oid::ObjectId};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Largest page a caller may request.
pub const MAX_PAGE_LIMIT: u64 = 5;

/// Largest skip the store can encode (a signed 64-bit count).
pub const MAX_SKIP: u64 = i64::MAX as u64;

/// Product row as stored in the `products` collection.
///
/// SKUs are not unique here: every sync appends the rows the source reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub product_sku: String,
    pub product_name: String,
    pub product_brand: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_color: Option<String>,
    pub product_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_stock: Option<i64>,
    pub product_created_at: bson::DateTime,
}

impl Product {
    /// Row for `new`, stamped with the insertion time.
    pub fn from_new(new: NewProduct, created_at: bson::DateTime) -> Self {
        Self {
            id: None,
            product_sku: new.product_sku,
            product_name: new.product_name,
            product_brand: new.product_brand,
            product_model: new.product_model,
            product_category: new.product_category,
            product_color: new.product_color,
            product_price: new.product_price,
            product_currency: new.product_currency,
            product_stock: new.product_stock,
            product_created_at: created_at,
        }
    }
}

/// A product projected from the content source, not yet stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub product_sku: String,
    pub product_name: String,
    pub product_brand: String,
    pub product_model: Option<String>,
    pub product_category: Option<String>,
    pub product_color: Option<String>,
    pub product_price: f64,
    pub product_currency: Option<String>,
    pub product_stock: Option<i64>,
}

/// Tombstone in the `deleted_products` collection; one per SKU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedSku {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub product_sku: String,
    pub product_deleted_at: bson::DateTime,
}

impl DeletedSku {
    pub fn new(sku: impl Into<String>) -> Self {
        Self {
            id: None,
            product_sku: sku.into(),
            product_deleted_at: bson::DateTime::now(),
        }
    }
}

/// Product as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "productSku": "CMX-100",
    "productName": "Espresso Maker",
    "productBrand": "Acme",
    "productModel": "X1",
    "productCategory": "Kitchen",
    "productColor": "Black",
    "productPrice": 149.9,
    "productCurrency": "USD",
    "productStock": 12,
    "productCreatedAt": "2024-01-15T10:00:00Z"
}))]
pub struct ProductView {
    pub product_sku: String,
    pub product_name: String,
    pub product_brand: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_color: Option<String>,
    pub product_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_stock: Option<i64>,
    pub product_created_at: DateTime<Utc>,
}

impl From<Product> for ProductView {
    fn from(p: Product) -> Self {
        Self {
            product_sku: p.product_sku,
            product_name: p.product_name,
            product_brand: p.product_brand,
            product_model: p.product_model,
            product_category: p.product_category,
            product_color: p.product_color,
            product_price: p.product_price,
            product_currency: p.product_currency,
            product_stock: p.product_stock,
            product_created_at: p.product_created_at.to_chrono(),
        }
    }
}

/// Query string of `GET /products`.
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    pub product_sku: Option<String>,
    pub product_name: Option<String>,
    pub product_brand: Option<String>,
    pub product_model: Option<String>,
    pub product_category: Option<String>,
    pub product_color: Option<String>,
    pub product_currency: Option<String>,
    #[validate(range(min = 0.0))]
    pub product_min_price: Option<f64>,
    #[validate(range(min = 0.0))]
    pub product_max_price: Option<f64>,
    #[validate(range(min = 0))]
    pub product_min_stock: Option<i64>,
    #[validate(range(min = 0))]
    pub product_max_stock: Option<i64>,
    /// Rows to skip
    #[validate(range(max = MAX_SKIP))]
    pub skip: u64,
    /// Page size, 1 to 5
    #[validate(range(min = 1, max = MAX_PAGE_LIMIT))]
    #[param(minimum = 1, maximum = 5)]
    pub limit: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total_items: u64,
    pub total_pages: u64,
    pub current_page: u64,
    /// Rows on this page
    pub page_size: u64,
}

impl PageMeta {
    /// `limit` must be non-zero; the query validator guarantees it.
    pub fn new(total_items: u64, skip: u64, limit: u64, page_size: usize) -> Self {
        let limit = limit.max(1);
        Self {
            total_items,
            total_pages: total_items.div_ceil(limit),
            current_page: (skip / limit).saturating_add(1),
            page_size: page_size as u64,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductPage {
    pub data: Vec<ProductView>,
    pub meta: PageMeta,
}

/// Outcome of one sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub fetched: usize,
    pub skipped_deleted: usize,
    /// Items missing sku, name, brand or price
    pub skipped_invalid: usize,
    pub inserted: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeletedCounts {
    /// Tombstones
    pub total_deleted_products: u64,
    /// Product rows
    pub total_products: u64,
    pub total_unique_deleted_product: u64,
    /// Distinct SKUs across product rows
    pub total_unique_product_skus: u64,
    /// Product rows whose SKU is tombstoned
    pub total_deleted_product_rows: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeletedPercentages {
    /// Tombstones over product rows, e.g. `12.50%`
    pub percentage_deleted_products: String,
    /// Tombstones over distinct SKUs
    pub percentage_unique_deleted_products: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeletedPercentageReport {
    pub data: DeletedCounts,
    pub deleted_products_percentage: DeletedPercentages,
}

fn default_true() -> bool {
    true
}

/// Query string of `GET /products/non-deleted-percentage`.
///
/// Dates are `YYYY-MM-DD` or RFC 3339; both or neither must be given.
#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct NonDeletedReportQuery {
    /// Count only rows with a price (default) or only rows without one
    #[serde(default = "default_true", alias = "includeOnlyWithPrice")]
    pub product_with_price: bool,
    pub product_created_at_start_date: Option<String>,
    pub product_created_at_end_date: Option<String>,
}

impl Default for NonDeletedReportQuery {
    fn default() -> Self {
        Self {
            product_with_price: true,
            product_created_at_start_date: None,
            product_created_at_end_date: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NonDeletedCounts {
    pub total_non_deleted_products: u64,
    pub total_products: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NonDeletedPercentages {
    pub percentage_non_deleted_products: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NonDeletedPercentageReport {
    pub data: NonDeletedCounts,
    pub non_deleted_products_percentage: NonDeletedPercentages,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BrandTotal {
    pub product_brand: String,
    pub total_products: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BrandTotalsData {
    pub total_products: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BrandTotalsReport {
    pub data: BrandTotalsData,
    pub total_products_by_product_brand: Vec<BrandTotal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_meta_arithmetic() {
        let meta = PageMeta::new(11, 5, 5, 5);
        assert_eq!(meta.total_pages, 3);
        assert_eq!(meta.current_page, 2);
        assert_eq!(meta.page_size, 5);

        let meta = PageMeta::new(10, 7, 5, 3);
        assert_eq!(meta.total_pages, 2);
        assert_eq!(meta.current_page, 2);
    }

    #[test]
    fn test_page_meta_empty_result() {
        let meta = PageMeta::new(0, 0, 5, 0);
        assert_eq!(meta.total_pages, 0);
        assert_eq!(meta.current_page, 1);
        assert_eq!(meta.page_size, 0);
    }

    #[test]
    fn test_page_meta_holds_for_many_triples() {
        for total in 0..30u64 {
            for limit in 1..=MAX_PAGE_LIMIT {
                for skip in 0..12u64 {
                    let meta = PageMeta::new(total, skip, limit, 0);
                    assert_eq!(meta.total_pages, (total + limit - 1) / limit);
                    assert_eq!(meta.current_page, skip / limit + 1);
                }
            }
        }
    }

    #[test]
    fn test_product_query_limit_bounds() {
        let query = |limit| ProductQuery {
            skip: 0,
            limit,
            ..Default::default()
        };
        assert!(query(0).validate().is_err());
        assert!(query(1).validate().is_ok());
        assert!(query(MAX_PAGE_LIMIT).validate().is_ok());
        assert!(query(MAX_PAGE_LIMIT + 1).validate().is_err());
    }

    #[test]
    fn test_product_query_skip_bound() {
        let query = |skip| ProductQuery {
            skip,
            limit: 1,
            ..Default::default()
        };
        assert!(query(MAX_SKIP).validate().is_ok());
        assert!(query(MAX_SKIP + 1).validate().is_err());
        assert!(query(u64::MAX).validate().is_err());
    }

    #[test]
    fn test_page_meta_does_not_overflow_on_huge_skip() {
        let meta = PageMeta::new(1, u64::MAX, 1, 0);
        assert_eq!(meta.current_page, u64::MAX);
        assert_eq!(meta.total_pages, 1);
    }

    #[test]
    fn test_product_query_rejects_negative_ranges() {
        let query = ProductQuery {
            limit: 1,
            product_min_price: Some(-1.0),
            ..Default::default()
        };
        assert!(query.validate().is_err());

        let query = ProductQuery {
            limit: 1,
            product_max_stock: Some(-3),
            ..Default::default()
        };
        assert!(query.validate().is_err());
    }

    #[test]
    fn test_non_deleted_query_alias_and_default() {
        let q: NonDeletedReportQuery = serde_json::from_str("{}").unwrap();
        assert!(q.product_with_price);

        let q: NonDeletedReportQuery =
            serde_json::from_str(r#"{"includeOnlyWithPrice": false}"#).unwrap();
        assert!(!q.product_with_price);
    }

    #[test]
    fn test_product_document_shape() {
        let product = Product::from_new(
            NewProduct {
                product_sku: "A1".into(),
                product_name: "Lamp".into(),
                product_brand: "Acme".into(),
                product_model: None,
                product_category: None,
                product_color: None,
                product_price: 10.0,
                product_currency: Some("USD".into()),
                product_stock: None,
            },
            bson::DateTime::from_millis(0),
        );
        let doc = bson::to_document(&product).unwrap();
        assert_eq!(doc.get_str("productSku").unwrap(), "A1");
        assert!(doc.get("_id").is_none());
        assert!(doc.get("productModel").is_none());
        assert!(doc.get_datetime("productCreatedAt").is_ok());
    }

    #[test]
    fn test_view_renders_rfc3339_timestamp() {
        let product = Product {
            id: None,
            product_sku: "A1".into(),
            product_name: "Lamp".into(),
            product_brand: "Acme".into(),
            product_model: None,
            product_category: None,
            product_color: None,
            product_price: 10.0,
            product_currency: None,
            product_stock: Some(2),
            product_created_at: bson::DateTime::from_millis(1_705_312_800_000),
        };
        let json = serde_json::to_value(ProductView::from(product)).unwrap();
        assert_eq!(json["productCreatedAt"], "2024-01-15T10:00:00Z");
        assert_eq!(json["productStock"], 2);
        assert!(json.get("productModel").is_none());
    }

    #[test]
    fn test_view_keeps_timestamps_outside_the_epoch_default() {
        let mut product = Product::from_new(
            NewProduct {
                product_sku: "A1".into(),
                product_name: "Lamp".into(),
                product_brand: "Acme".into(),
                product_model: None,
                product_category: None,
                product_color: None,
                product_price: 10.0,
                product_currency: None,
                product_stock: None,
            },
            bson::DateTime::from_millis(-86_400_000),
        );
        let view = ProductView::from(product.clone());
        assert_eq!(view.product_created_at.to_rfc3339(), "1969-12-31T00:00:00+00:00");

        product.product_created_at = bson::DateTime::MAX;
        let view = ProductView::from(product);
        assert_ne!(view.product_created_at, DateTime::<Utc>::default());
    }
}
