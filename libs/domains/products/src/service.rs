//! Product Service - sync, query, soft delete and reports

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime};
use mongodb::bson;
use tracing::instrument;

use crate::error::{internal_unless_domain, ProductError, ProductResult};
use crate::models::{
    BrandTotalsData, BrandTotalsReport, DeletedCounts, DeletedPercentageReport,
    DeletedPercentages, NewProduct, NonDeletedCounts, NonDeletedPercentageReport,
    NonDeletedPercentages, NonDeletedReportQuery, PageMeta, ProductPage, ProductQuery,
    ProductView, SyncSummary,
};
use crate::query::{Clause, ProductField, ProductPredicate, Scalar};
use crate::repository::{DeletedSkuRepository, ProductRepository};
use crate::source::ProductSource;

const DELETE_FAILED: &str = "An error occurred while deleting the product.";
const DELETED_REPORT_FAILED: &str = "An error occurred while generating deleted products report.";
const NON_DELETED_REPORT_FAILED: &str =
    "An error occurred while generating non-deleted products report.";
const BRAND_REPORT_FAILED: &str = "An error occurred while fetching product brand report.";

/// Last millisecond of a UTC day, relative to its midnight.
const END_OF_DAY_MILLIS: i64 = 86_399_999;

/// `part / whole` as a percentage with two decimals; `0.00%` when `whole` is 0.
pub fn percentage(part: u64, whole: u64) -> String {
    let value = if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    };
    format!("{value:.2}%")
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp and returns its UTC day.
fn parse_day(raw: &str) -> ProductResult<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.to_utc().date_naive()))
        .map_err(|_| ProductError::Validation(format!("Invalid date: {raw}")))
}

fn start_of_day(day: NaiveDate) -> bson::DateTime {
    bson::DateTime::from_millis(day.and_time(NaiveTime::MIN).and_utc().timestamp_millis())
}

fn end_of_day(day: NaiveDate) -> bson::DateTime {
    bson::DateTime::from_millis(start_of_day(day).timestamp_millis() + END_OF_DAY_MILLIS)
}

/// Creation window of the non-deleted report, inclusive on both ends.
fn creation_window(
    start: Option<&str>,
    end: Option<&str>,
) -> ProductResult<Option<(bson::DateTime, bson::DateTime)>> {
    match (start, end) {
        (None, None) => Ok(None),
        (Some(start), Some(end)) => {
            let (start, end) = (parse_day(start)?, parse_day(end)?);
            if start > end {
                return Err(ProductError::Validation(
                    "Start date cannot be greater than end date.".to_string(),
                ));
            }
            Ok(Some((start_of_day(start), end_of_day(end))))
        }
        _ => Err(ProductError::Validation(
            "Both start and end dates must be provided together".to_string(),
        )),
    }
}

/// Business operations over the product store, the tombstone store and the
/// content source.
pub struct ProductService<P, D, S> {
    products: Arc<P>,
    deleted: Arc<D>,
    source: Arc<S>,
}

impl<P, D, S> Clone for ProductService<P, D, S> {
    fn clone(&self) -> Self {
        Self {
            products: Arc::clone(&self.products),
            deleted: Arc::clone(&self.deleted),
            source: Arc::clone(&self.source),
        }
    }
}

impl<P, D, S> ProductService<P, D, S>
where
    P: ProductRepository,
    D: DeletedSkuRepository,
    S: ProductSource,
{
    pub fn new(products: P, deleted: D, source: S) -> Self {
        Self {
            products: Arc::new(products),
            deleted: Arc::new(deleted),
            source: Arc::new(source),
        }
    }

    async fn deleted_skus(&self) -> ProductResult<Vec<String>> {
        Ok(self
            .deleted
            .find_all()
            .await?
            .into_iter()
            .map(|d| d.product_sku)
            .collect())
    }

    /// Pull every entry from the source and append the ones whose SKU is not
    /// tombstoned.
    #[instrument(skip(self))]
    pub async fn sync_products(&self) -> ProductResult<SyncSummary> {
        let items = self.source.fetch_products().await?;
        let deleted: HashSet<String> = self.deleted_skus().await?.into_iter().collect();

        let mut summary = SyncSummary {
            fetched: items.len(),
            ..Default::default()
        };

        let mut fresh = Vec::with_capacity(items.len());
        for item in items {
            if item
                .fields
                .sku
                .as_ref()
                .is_some_and(|sku| deleted.contains(sku))
            {
                summary.skipped_deleted += 1;
                continue;
            }
            match NewProduct::try_from(item.fields) {
                Ok(product) => fresh.push(product),
                Err(reason) => {
                    tracing::warn!(%reason, "Skipping source item");
                    summary.skipped_invalid += 1;
                }
            }
        }

        summary.inserted = self.products.insert_many(fresh).await?;
        tracing::info!(
            fetched = summary.fetched,
            skipped_deleted = summary.skipped_deleted,
            skipped_invalid = summary.skipped_invalid,
            inserted = summary.inserted,
            "Product sync finished"
        );
        Ok(summary)
    }

    /// Entry point for the scheduler; failures are logged and swallowed.
    pub async fn run_scheduled_sync(&self) {
        tracing::info!("Initiating product synchronization");
        if let Err(e) = self.sync_products().await {
            tracing::error!(error = %e, "Scheduled product sync failed");
        }
    }

    #[instrument(skip(self))]
    pub async fn find_filtered_products(&self, query: ProductQuery) -> ProductResult<ProductPage> {
        let predicate = ProductPredicate::from_query(&query)
            .and(Clause::NotIn(ProductField::Sku, self.deleted_skus().await?));

        let (total, rows) = tokio::try_join!(
            self.products.count(&predicate),
            self.products.find_page(&predicate, query.skip, query.limit),
        )?;

        let meta = PageMeta::new(total, query.skip, query.limit, rows.len());
        Ok(ProductPage {
            data: rows.into_iter().map(ProductView::from).collect(),
            meta,
        })
    }

    /// Tombstone `sku`. Its rows stay in the store but disappear from
    /// queries, reports and future syncs.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, sku: &str) -> ProductResult<()> {
        async {
            if self.deleted.find_by_sku(sku).await?.is_some() {
                return Err(ProductError::AlreadyDeleted {
                    sku: sku.to_string(),
                });
            }
            if !self.products.exists_by_sku(sku).await? {
                return Err(ProductError::NotFound {
                    sku: sku.to_string(),
                });
            }
            self.deleted.insert(sku).await?;
            Ok::<_, ProductError>(())
        }
        .await
        .map_err(internal_unless_domain("delete_product", DELETE_FAILED))
    }

    #[instrument(skip(self))]
    pub async fn deleted_percentage_report(&self) -> ProductResult<DeletedPercentageReport> {
        async {
            let deleted = self.deleted_skus().await?;
            let tombstones = deleted.len() as u64;
            let shadowed = ProductPredicate::all().and(Clause::In(ProductField::Sku, deleted));

            let all = ProductPredicate::all();
            let (total_products, unique_skus, shadowed_rows) = tokio::try_join!(
                self.products.count(&all),
                self.products.count_distinct_skus(),
                self.products.count(&shadowed),
            )?;

            Ok::<_, ProductError>(DeletedPercentageReport {
                data: DeletedCounts {
                    total_deleted_products: tombstones,
                    total_products,
                    total_unique_deleted_product: tombstones,
                    total_unique_product_skus: unique_skus,
                    total_deleted_product_rows: shadowed_rows,
                },
                deleted_products_percentage: DeletedPercentages {
                    percentage_deleted_products: percentage(tombstones, total_products),
                    percentage_unique_deleted_products: percentage(tombstones, unique_skus),
                },
            })
        }
        .await
        .map_err(internal_unless_domain("deleted_percentage_report", DELETED_REPORT_FAILED))
    }

    #[instrument(skip(self))]
    pub async fn non_deleted_percentage_report(
        &self,
        query: NonDeletedReportQuery,
    ) -> ProductResult<NonDeletedPercentageReport> {
        async {
            let window = creation_window(
                query.product_created_at_start_date.as_deref(),
                query.product_created_at_end_date.as_deref(),
            )?;

            let mut predicate = ProductPredicate::all()
                .and(Clause::Present(ProductField::Price, query.product_with_price));
            if let Some((start, end)) = window {
                predicate = predicate.and(Clause::Between {
                    field: ProductField::CreatedAt,
                    min: Some(Scalar::Time(start)),
                    max: Some(Scalar::Time(end)),
                });
            }
            let predicate =
                predicate.and(Clause::NotIn(ProductField::Sku, self.deleted_skus().await?));

            let all = ProductPredicate::all();
            let (non_deleted, total_products) = tokio::try_join!(
                self.products.count(&predicate),
                self.products.count(&all),
            )?;

            Ok::<_, ProductError>(NonDeletedPercentageReport {
                data: NonDeletedCounts {
                    total_non_deleted_products: non_deleted,
                    total_products,
                },
                non_deleted_products_percentage: NonDeletedPercentages {
                    percentage_non_deleted_products: percentage(non_deleted, total_products),
                },
            })
        }
        .await
        .map_err(internal_unless_domain(
            "non_deleted_percentage_report",
            NON_DELETED_REPORT_FAILED,
        ))
    }

    #[instrument(skip(self))]
    pub async fn totals_by_brand(&self) -> ProductResult<BrandTotalsReport> {
        async {
            let all = ProductPredicate::all();
            let (brands, total_products) = tokio::try_join!(
                self.products.count_by_brand(),
                self.products.count(&all),
            )?;
            Ok::<_, ProductError>(BrandTotalsReport {
                data: BrandTotalsData { total_products },
                total_products_by_product_brand: brands,
            })
        }
        .await
        .map_err(internal_unless_domain("totals_by_brand", BRAND_REPORT_FAILED))
    }
}
