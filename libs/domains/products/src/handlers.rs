//! HTTP handlers for the catalog API

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Json, Router,
};
use axum_helpers::{
    errors::responses::{
        BadGatewayResponse, BadRequestValidationResponse, ConflictResponse,
        InternalServerErrorResponse, NotFoundResponse, UnauthorizedResponse,
    },
    jwt_auth_middleware, JwtAuth, ValidatedQuery,
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::ProductResult;
use crate::models::{
    BrandTotal, BrandTotalsData, BrandTotalsReport, DeletedCounts, DeletedPercentageReport,
    DeletedPercentages, NonDeletedCounts, NonDeletedPercentageReport, NonDeletedPercentages,
    NonDeletedReportQuery, PageMeta, ProductPage, ProductQuery, ProductView,
};
use crate::repository::{DeletedSkuRepository, ProductRepository};
use crate::service::ProductService;
use crate::source::ProductSource;

type SharedService<P, D, S> = State<Arc<ProductService<P, D, S>>>;

/// OpenAPI documentation for the catalog routes
#[derive(OpenApi)]
#[openapi(
    paths(
        sync_products,
        list_products,
        delete_product,
        deleted_percentage,
        non_deleted_percentage,
        totals_by_brand,
    ),
    components(
        schemas(
            ProductView, ProductPage, PageMeta,
            DeletedPercentageReport, DeletedCounts, DeletedPercentages,
            NonDeletedPercentageReport, NonDeletedCounts, NonDeletedPercentages,
            BrandTotalsReport, BrandTotalsData, BrandTotal
        ),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            ConflictResponse,
            UnauthorizedResponse,
            BadGatewayResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Products", description = "Catalog sync, query and soft delete"),
        (name = "Reports", description = "Catalog reports, bearer token required")
    )
)]
pub struct ApiDoc;

/// Public routes: sync, query, soft delete.
pub fn public_router<P, D, S>(service: ProductService<P, D, S>) -> Router
where
    P: ProductRepository + 'static,
    D: DeletedSkuRepository + 'static,
    S: ProductSource + 'static,
{
    Router::new()
        .route("/products", get(list_products::<P, D, S>))
        .route("/products/fetch", post(sync_products::<P, D, S>))
        .route("/products/{sku}", delete(delete_product::<P, D, S>))
        .with_state(Arc::new(service))
}

/// Report routes, each behind the bearer-token middleware.
pub fn internal_router<P, D, S>(service: ProductService<P, D, S>, auth: JwtAuth) -> Router
where
    P: ProductRepository + 'static,
    D: DeletedSkuRepository + 'static,
    S: ProductSource + 'static,
{
    Router::new()
        .route(
            "/products/deleted-percentage",
            get(deleted_percentage::<P, D, S>),
        )
        .route(
            "/products/non-deleted-percentage",
            get(non_deleted_percentage::<P, D, S>),
        )
        .route(
            "/products/total-products-by-brand",
            get(totals_by_brand::<P, D, S>),
        )
        .route_layer(from_fn_with_state(auth, jwt_auth_middleware))
        .with_state(Arc::new(service))
}

/// Both routers merged.
pub fn router<P, D, S>(service: ProductService<P, D, S>, auth: JwtAuth) -> Router
where
    P: ProductRepository + 'static,
    D: DeletedSkuRepository + 'static,
    S: ProductSource + 'static,
{
    public_router(service.clone()).merge(internal_router(service, auth))
}

/// Pull products from the content source and store the new ones
#[utoipa::path(
    post,
    path = "/products/fetch",
    tag = "Products",
    responses(
        (status = 200, description = "Sync finished"),
        (status = 502, response = BadGatewayResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn sync_products<P, D, S>(
    State(service): SharedService<P, D, S>,
) -> ProductResult<StatusCode>
where
    P: ProductRepository,
    D: DeletedSkuRepository,
    S: ProductSource,
{
    service.sync_products().await?;
    Ok(StatusCode::OK)
}

/// Filtered, paginated products; deleted SKUs are never returned
#[utoipa::path(
    get,
    path = "/products",
    tag = "Products",
    params(ProductQuery),
    responses(
        (status = 200, description = "One page of products", body = ProductPage),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_products<P, D, S>(
    State(service): SharedService<P, D, S>,
    ValidatedQuery(query): ValidatedQuery<ProductQuery>,
) -> ProductResult<Json<ProductPage>>
where
    P: ProductRepository,
    D: DeletedSkuRepository,
    S: ProductSource,
{
    let page = service.find_filtered_products(query).await?;
    Ok(Json(page))
}

/// Soft-delete every row of a SKU
#[utoipa::path(
    delete,
    path = "/products/{sku}",
    tag = "Products",
    params(
        ("sku" = String, Path, description = "Product SKU")
    ),
    responses(
        (status = 200, description = "Product deleted"),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_product<P, D, S>(
    State(service): SharedService<P, D, S>,
    Path(sku): Path<String>,
) -> ProductResult<StatusCode>
where
    P: ProductRepository,
    D: DeletedSkuRepository,
    S: ProductSource,
{
    service.delete_product(&sku).await?;
    Ok(StatusCode::OK)
}

/// Share of rows and of distinct SKUs that are soft-deleted
#[utoipa::path(
    get,
    path = "/products/deleted-percentage",
    tag = "Reports",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Deleted products report", body = DeletedPercentageReport),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn deleted_percentage<P, D, S>(
    State(service): SharedService<P, D, S>,
) -> ProductResult<Json<DeletedPercentageReport>>
where
    P: ProductRepository,
    D: DeletedSkuRepository,
    S: ProductSource,
{
    Ok(Json(service.deleted_percentage_report().await?))
}

/// Share of rows that are not soft-deleted, by price presence and creation window
#[utoipa::path(
    get,
    path = "/products/non-deleted-percentage",
    tag = "Reports",
    security(("bearer" = [])),
    params(NonDeletedReportQuery),
    responses(
        (status = 200, description = "Non-deleted products report", body = NonDeletedPercentageReport),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn non_deleted_percentage<P, D, S>(
    State(service): SharedService<P, D, S>,
    ValidatedQuery(query): ValidatedQuery<NonDeletedReportQuery>,
) -> ProductResult<Json<NonDeletedPercentageReport>>
where
    P: ProductRepository,
    D: DeletedSkuRepository,
    S: ProductSource,
{
    Ok(Json(service.non_deleted_percentage_report(query).await?))
}

/// Row count per brand
#[utoipa::path(
    get,
    path = "/products/total-products-by-brand",
    tag = "Reports",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Rows per brand", body = BrandTotalsReport),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn totals_by_brand<P, D, S>(
    State(service): SharedService<P, D, S>,
) -> ProductResult<Json<BrandTotalsReport>>
where
    P: ProductRepository,
    D: DeletedSkuRepository,
    S: ProductSource,
{
    Ok(Json(service.totals_by_brand().await?))
}
