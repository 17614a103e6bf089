//! Report endpoints: one per builder, filters taken from the query string.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use retail_hub_core::reports::{BenchmarkReport, CustomerReport, ProductReport, SalesReport};
use retail_hub_db::reports::{benchmark_report, customer_report, product_report, sales_report};

use crate::error::{ApiError, ApiResult};
use crate::metrics::record_request;
use crate::params::FilterParams;
use crate::state::AppState;

/// Run one report build, recording its duration and outcome.
pub(crate) async fn timed<T>(endpoint: &str, build: impl Future<Output = ApiResult<T>>) -> ApiResult<T> {
    let start = Instant::now();
    let result = build.await;
    let status = match &result {
        Ok(_) => "200".to_string(),
        Err(e) => e.status().as_u16().to_string(),
    };
    record_request(endpoint, &status, start.elapsed());
    result
}

/// GET /api/reports/sales
pub async fn get_sales(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Json<SalesReport>> {
    timed("sales", async {
        let filters = params.sales(state.today())?;
        Ok::<_, ApiError>(Json(sales_report(&state.db, &filters).await))
    })
    .await
}

/// GET /api/reports/products
pub async fn get_products(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Json<ProductReport>> {
    timed("products", async {
        let filters = params.products(state.today())?;
        Ok::<_, ApiError>(Json(product_report(&state.db, &filters).await))
    })
    .await
}

/// GET /api/reports/benchmarking
pub async fn get_benchmarking(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Json<BenchmarkReport>> {
    timed("benchmarking", async {
        let filters = params.benchmarking(state.today())?;
        Ok::<_, ApiError>(Json(benchmark_report(&state.db, &filters).await))
    })
    .await
}

/// GET /api/reports/customers
pub async fn get_customers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Json<CustomerReport>> {
    timed("customers", async {
        let filters = params.customers(state.today())?;
        Ok::<_, ApiError>(Json(customer_report(&state.db, &filters).await))
    })
    .await
}

/// Create the report routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/reports/sales", get(get_sales))
        .route("/reports/products", get(get_products))
        .route("/reports/benchmarking", get(get_benchmarking))
        .route("/reports/customers", get(get_customers))
}
