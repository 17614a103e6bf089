// crates/core/src/reports.rs
//! Report payloads produced by the builders and served by the API.
//!
//! Every report is a set of independent sections. A section that failed
//! carries its message; the rest of the report still renders.

use crate::buckets::{BandCount, HistogramBin};
use crate::segments::{
    CustomerSegment, PricePosition, PricingInsight, ProductQuadrant, QuadrantThresholds,
    SegmentThresholds, StockHealth,
};
use crate::stats::growth_pct;
use serde::Serialize;
use ts_rs::TS;

// ============================================================================
// Sections
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Section<T> {
    Ready { data: T },
    Empty { message: String },
    Failed { message: String },
}

impl<T> Section<T> {
    pub fn ready(data: T) -> Self {
        Section::Ready { data }
    }

    pub fn empty(message: impl Into<String>) -> Self {
        Section::Empty {
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Section::Failed {
            message: message.into(),
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Section::Ready { data } => Some(data),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Section::Failed { .. })
    }
}

impl<T> Section<Vec<T>> {
    /// `Empty` with `message` when there are no rows.
    pub fn rows(rows: Vec<T>, message: &str) -> Self {
        if rows.is_empty() {
            Section::empty(message)
        } else {
            Section::ready(rows)
        }
    }
}

/// Current vs previous value of one KPI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub current: f64,
    pub previous: f64,
    pub delta: f64,
    /// None if previous == 0.
    pub growth_pct: Option<f64>,
}

impl Comparison {
    pub fn new(current: f64, previous: f64) -> Self {
        Self {
            current,
            previous,
            delta: current - previous,
            growth_pct: growth_pct(current, previous),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub start: String,
    pub end: String,
    pub previous_start: String,
    pub previous_end: String,
    #[ts(type = "number")]
    pub days: i64,
}

// ============================================================================
// Sales
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct SalesKpis {
    pub revenue: Comparison,
    pub orders: Comparison,
    pub customers: Comparison,
    pub aov: Comparison,
    pub units: Comparison,
    pub discounts: Comparison,
    /// Orders per unique customer × 100.
    pub conversion_rate: Option<f64>,
    pub avg_discount: Option<f64>,
    pub revenue_per_customer: Option<f64>,
    /// Discounts as a share of revenue × 100.
    pub discount_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct DailyPoint {
    pub date: String,
    pub revenue: f64,
    #[ts(type = "number")]
    pub orders: i64,
    pub aov: f64,
    pub revenue_ma7: f64,
    pub orders_ma7: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct WeekdayTotal {
    pub day: String,
    pub revenue: f64,
    #[ts(type = "number")]
    pub orders: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct CategorySales {
    pub category: String,
    pub revenue: f64,
    #[ts(type = "number")]
    pub orders: i64,
    #[ts(type = "number")]
    pub units: i64,
    pub aov: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct BrandSales {
    pub brand: String,
    pub revenue: f64,
    #[ts(type = "number")]
    pub orders: i64,
    #[ts(type = "number")]
    pub units: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct ProductSales {
    pub item_id: String,
    pub title: String,
    pub brand: Option<String>,
    pub revenue: f64,
    #[ts(type = "number")]
    pub units: i64,
    #[ts(type = "number")]
    pub orders: i64,
    pub avg_price: f64,
    /// 0 when the product has no reviews.
    pub avg_rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct MerchantSales {
    pub merchant: String,
    pub revenue: f64,
    #[ts(type = "number")]
    pub orders: i64,
    pub aov: f64,
    #[ts(type = "number")]
    pub units: i64,
    pub discounts: f64,
    pub discount_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct MerchantBreakdown {
    pub top_merchant: Option<String>,
    pub merchants: Vec<MerchantSales>,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub period: Period,
    pub kpis: Section<SalesKpis>,
    pub daily_trend: Section<Vec<DailyPoint>>,
    pub weekdays: Section<Vec<WeekdayTotal>>,
    pub top_categories: Section<Vec<CategorySales>>,
    pub top_brands: Section<Vec<BrandSales>>,
    pub top_products: Section<Vec<ProductSales>>,
    pub merchants: Section<MerchantBreakdown>,
}

// ============================================================================
// Products
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct InventoryHealth {
    #[ts(type = "number")]
    pub total_products: i64,
    #[ts(type = "number")]
    pub in_stock: i64,
    #[ts(type = "number")]
    pub limited_stock: i64,
    #[ts(type = "number")]
    pub out_of_stock: i64,
    pub avg_price: Option<f64>,
    pub stock_rate: Option<f64>,
    pub health: StockHealth,
    pub avg_daily_units: f64,
    pub revenue_30d: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct StockHit {
    pub item_id: String,
    pub title: String,
    pub brand: Option<String>,
    pub sku: Option<String>,
    pub availability: Option<String>,
    pub price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct TopSeller {
    pub item_id: String,
    pub title: String,
    pub brand: Option<String>,
    #[ts(type = "number")]
    pub units: i64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct ProfitabilityPoint {
    pub item_id: String,
    pub title: String,
    pub brand: Option<String>,
    pub revenue: f64,
    #[ts(type = "number")]
    pub units: i64,
    pub avg_price: f64,
    pub quadrant: ProductQuadrant,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct QuadrantCount {
    pub quadrant: ProductQuadrant,
    pub label: String,
    #[ts(type = "number")]
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct ProfitabilityMatrix {
    pub thresholds: QuadrantThresholds,
    pub quadrants: Vec<QuadrantCount>,
    pub products: Vec<ProfitabilityPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct PriceStat {
    pub item_id: String,
    pub title: String,
    pub brand: Option<String>,
    pub avg_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub stddev: Option<f64>,
    #[ts(type = "number")]
    pub sales: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct PriceSummary {
    pub highest: f64,
    pub lowest: f64,
    pub mean: f64,
    pub median: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct PriceAnalysis {
    pub summary: PriceSummary,
    pub histogram: Vec<HistogramBin>,
    pub bands: Vec<BandCount>,
    /// Products after search/price refinement, capped at the display limit.
    pub products: Vec<PriceStat>,
    #[ts(type = "number")]
    pub matched: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct ReviewStat {
    pub item_id: String,
    pub title: String,
    pub brand: Option<String>,
    pub avg_rating: f64,
    #[ts(type = "number")]
    pub total_reviews: i64,
    pub avg_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    pub overall_avg: f64,
    pub highest: f64,
    #[ts(type = "number")]
    pub products: u64,
    #[ts(type = "number")]
    pub highly_rated: u64,
    #[ts(type = "number")]
    pub poorly_rated: u64,
    #[ts(type = "number")]
    pub total_reviews: i64,
    #[ts(type = "number")]
    pub star_performers: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct ReviewAnalysis {
    pub summary: ReviewSummary,
    pub bands: Vec<BandCount>,
    pub top_rated: Vec<ReviewStat>,
    pub lowest_rated: Vec<ReviewStat>,
    /// Products matching the search / minimum-rating / minimum-reviews refinement.
    pub matching: Vec<ReviewStat>,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct ProductReport {
    pub inventory: Section<InventoryHealth>,
    pub stock_lookup: Section<Vec<StockHit>>,
    pub top_sellers: Section<Vec<TopSeller>>,
    pub profitability: Section<ProfitabilityMatrix>,
    pub pricing: Section<PriceAnalysis>,
    pub reviews: Section<ReviewAnalysis>,
}

// ============================================================================
// Benchmarking
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct PriceComparisonRow {
    pub item_id: String,
    pub title: String,
    pub brand: Option<String>,
    pub store: Option<String>,
    pub our_price: f64,
    pub base_price: Option<f64>,
    pub competitor_price: f64,
    pub difference: f64,
    pub difference_pct: Option<f64>,
    pub position: PricePosition,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct PriceComparison {
    #[ts(type = "number")]
    pub above: u64,
    #[ts(type = "number")]
    pub below: u64,
    #[ts(type = "number")]
    pub at: u64,
    pub avg_difference_pct: Option<f64>,
    pub insight: Option<PricingInsight>,
    /// Upper bound for the parity line on the scatter chart.
    pub parity_max: f64,
    pub rows: Vec<PriceComparisonRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct CompetitorTrendPoint {
    pub date: String,
    pub store: String,
    pub avg_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    #[ts(type = "number")]
    pub observations: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct CompetitorKpis {
    pub avg_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    #[ts(type = "number")]
    pub products_tracked: i64,
    /// Sample stddev of the per-date average prices.
    pub volatility: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct CategoryPrice {
    pub category: String,
    pub avg_price: f64,
    #[ts(type = "number")]
    pub products: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct StorePrice {
    pub store: String,
    pub avg_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    #[ts(type = "number")]
    pub products: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct CompetitorAnalysis {
    pub competitor: String,
    pub kpis: CompetitorKpis,
    pub trend: Vec<CompetitorTrendPoint>,
    pub categories: Vec<CategoryPrice>,
    pub stores: Vec<StorePrice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct HierarchyNode {
    pub category: String,
    pub subcategory: String,
    pub store: String,
    #[ts(type = "number")]
    pub products: i64,
    pub avg_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkReport {
    pub comparison: Section<PriceComparison>,
    pub competitor: Section<CompetitorAnalysis>,
    pub hierarchy: Section<Vec<HierarchyNode>>,
}

// ============================================================================
// Customers
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodStat {
    pub method: String,
    #[ts(type = "number")]
    pub transactions: i64,
    pub revenue: f64,
    pub avg_transaction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct PaymentMix {
    pub top_method: Option<String>,
    pub top_share_pct: Option<f64>,
    pub methods: Vec<PaymentMethodStat>,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct CustomerProfile {
    #[ts(type = "number")]
    pub customer_id: i64,
    #[ts(type = "number")]
    pub frequency: i64,
    pub total_spending: f64,
    pub aov: f64,
    pub last_purchase: String,
    #[ts(type = "number")]
    pub days_since_last_purchase: i64,
    pub segment: CustomerSegment,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct SegmentSummary {
    pub segment: CustomerSegment,
    pub label: String,
    #[ts(type = "number")]
    pub customers: u64,
    pub revenue: f64,
    pub revenue_per_customer: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct ClvInsights {
    pub avg_value: f64,
    #[ts(type = "number")]
    pub top_decile_customers: u64,
    pub top_decile_value: f64,
    pub top_decile_share_pct: Option<f64>,
    pub total_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct Segmentation {
    pub thresholds: SegmentThresholds,
    pub segments: Vec<SegmentSummary>,
    /// Customers matching the refinement filters.
    #[ts(type = "number")]
    pub matched: u64,
    pub top_customers: Vec<CustomerProfile>,
    pub clv: Option<ClvInsights>,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct CustomerReport {
    pub period: Period,
    pub payments: Section<PaymentMix>,
    pub segmentation: Section<Segmentation>,
}
