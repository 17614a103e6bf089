//! Page router: navigation list and slug dispatch.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use retail_hub_core::chat::STARTER_SUGGESTIONS;
use retail_hub_core::reports::{BenchmarkReport, CustomerReport, ProductReport, SalesReport};
use retail_hub_core::{Page, PageInfo};
use retail_hub_db::reports::{benchmark_report, customer_report, product_report, sales_report};
use serde::Serialize;

use super::reports::timed;
use crate::error::{ApiError, ApiResult};
use crate::params::FilterParams;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantPage {
    pub configured: bool,
    pub suggestions: Vec<String>,
}

/// The body of one rendered page.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum PageContent {
    Sales(SalesReport),
    Products(ProductReport),
    Benchmarking(BenchmarkReport),
    Customers(CustomerReport),
    Assistant(AssistantPage),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    pub page: PageInfo,
    pub content: PageContent,
}

/// Evaluate `page` top to bottom with the given filters.
pub async fn render(state: &AppState, page: Page, params: &FilterParams) -> ApiResult<PageContent> {
    let today = state.today();
    let db = &state.db;
    let content = match page {
        Page::Sales => PageContent::Sales(sales_report(db, &params.sales(today)?).await),
        Page::Products => PageContent::Products(product_report(db, &params.products(today)?).await),
        Page::Benchmarking => {
            PageContent::Benchmarking(benchmark_report(db, &params.benchmarking(today)?).await)
        }
        Page::Customers => PageContent::Customers(customer_report(db, &params.customers(today)?).await),
        Page::Assistant => PageContent::Assistant(AssistantPage {
            configured: state.analyst.is_configured(),
            suggestions: STARTER_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
        }),
    };
    Ok(content)
}

/// GET /api/pages - All pages in navigation order.
pub async fn list_pages() -> Json<Vec<PageInfo>> {
    Json(Page::ALL.into_iter().map(Page::info).collect())
}

/// GET /api/pages/{slug} - Dispatch a navigation slug to its page.
pub async fn get_page(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Json<PageView>> {
    let page: Page = slug.parse().map_err(|_| ApiError::PageNotFound(slug.clone()))?;
    tracing::debug!(page = page.slug(), "rendering page");
    let content = timed(page.slug(), render(&state, page, &params)).await?;
    Ok(Json(PageView {
        page: page.info(),
        content,
    }))
}

/// Create the page routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/pages", get(list_pages))
        .route("/pages/{slug}", get(get_page))
}
