// crates/db/src/reports/products.rs
//! Product performance: inventory health, stock lookup, top sellers,
//! profitability quadrants, price spread and review analysis.

use chrono::NaiveDate;
use retail_hub_core::buckets::{histogram, PriceBand, RatingBand, HISTOGRAM_BINS};
use retail_hub_core::filters::{resolve_search, Choice, Column, DateRange, FilterSet};
use retail_hub_core::reports::{
    InventoryHealth, PriceAnalysis, PriceStat, PriceSummary, ProductReport, ProfitabilityMatrix,
    ProfitabilityPoint, QuadrantCount, ReviewAnalysis, ReviewStat, ReviewSummary, Section,
    StockHit, TopSeller,
};
use retail_hub_core::segments::{ProductQuadrant, QuadrantThresholds, StockHealth};
use retail_hub_core::stats::{mean, median, percent, round_to, stddev_from_sums};

use super::settle;
use crate::query::BoundQuery;
use crate::{Database, DbResult};

/// Window for sales velocity.
const VELOCITY_DAYS: i64 = 30;
/// Window for sellers, profitability and price spread.
const PERFORMANCE_DAYS: i64 = 90;

pub const DEFAULT_PRICE_LIMIT: usize = 15;
pub const PRICE_LIMIT_RANGE: (usize, usize) = (5, 30);

const HIGH_RATING: f64 = 4.0;
const LOW_RATING: f64 = 3.0;
const REVIEW_HIGHLIGHTS: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct ProductFilters {
    pub brand: Choice,
    pub category: Choice,
    /// Stock lookup text; the section is skipped when blank.
    pub lookup: Option<String>,
    pub price_search: Option<String>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub price_limit: usize,
    pub review_search: Option<String>,
    pub min_rating: f64,
    pub min_reviews: i64,
    pub as_of: NaiveDate,
}

impl ProductFilters {
    pub fn new(as_of: NaiveDate) -> Self {
        Self {
            brand: Choice::All,
            category: Choice::All,
            lookup: None,
            price_search: None,
            price_min: None,
            price_max: None,
            price_limit: DEFAULT_PRICE_LIMIT,
            review_search: None,
            min_rating: 0.0,
            min_reviews: 0,
            as_of,
        }
    }

    fn catalogue(&self) -> FilterSet {
        FilterSet::new()
            .with(self.brand.resolve(Column::Brand))
            .with(self.category.resolve(Column::ProductCategory))
    }

    fn trailing(&self, days: i64) -> FilterSet {
        let range = DateRange::trailing(self.as_of, days).unwrap_or(DateRange {
            start: NaiveDate::MIN,
            end: self.as_of,
        });
        self.catalogue().with(Some(range.resolve(Column::SaleDate)))
    }

    fn display_limit(&self) -> usize {
        self.price_limit.clamp(PRICE_LIMIT_RANGE.0, PRICE_LIMIT_RANGE.1)
    }
}

pub async fn product_report(db: &Database, filters: &ProductFilters) -> ProductReport {
    tracing::debug!(as_of = %filters.as_of, "building product report");
    ProductReport {
        inventory: settle("inventory health", inventory(db, filters).await),
        stock_lookup: settle("stock lookup", stock_lookup(db, filters).await),
        top_sellers: settle("top sellers", top_sellers(db, filters).await),
        profitability: settle("profitability matrix", profitability(db, filters).await),
        pricing: settle("price analysis", pricing(db, filters).await),
        reviews: settle("review analysis", reviews(db, filters).await),
    }
}

fn matches_text(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn search_text(text: &Option<String>) -> Option<&str> {
    text.as_deref().map(str::trim).filter(|t| !t.is_empty())
}

// ============================================================================
// Inventory
// ============================================================================

async fn inventory(db: &Database, filters: &ProductFilters) -> DbResult<Section<InventoryHealth>> {
    let catalogue = filters.catalogue();

    let mut counts = BoundQuery::new(
        "SELECT COUNT(DISTINCT p.ITEM_ID), \
                COALESCE(SUM(a.AVAILABILITY_INDICATOR = 'IN_STOCK'), 0), \
                COALESCE(SUM(a.AVAILABILITY_INDICATOR = 'LIMITED_STOCK'), 0), \
                COALESCE(SUM(a.AVAILABILITY_INDICATOR = 'OUT_OF_STOCK'), 0) \
         FROM Products p LEFT JOIN Availability a ON a.ITEM_ID = p.ITEM_ID WHERE 1=1",
    );
    counts.filters(&catalogue);
    let (total, in_stock, limited, out) = counts
        .fetch_one_cached::<(i64, i64, i64, i64)>(db)
        .await?
        .unwrap_or_default();
    if total == 0 {
        return Ok(Section::empty("No products match the selected filters"));
    }

    let mut price = BoundQuery::new(
        "SELECT CAST(AVG(pr.PRODUCT_PRICE) AS REAL) \
         FROM Products p JOIN Pricing pr ON pr.ITEM_ID = p.ITEM_ID WHERE 1=1",
    );
    price.filters(&catalogue);
    let avg_price = price
        .fetch_one_cached::<(Option<f64>,)>(db)
        .await?
        .and_then(|(v,)| v);

    let mut velocity = BoundQuery::new(
        "SELECT CAST(AVG(daily_units) AS REAL), CAST(SUM(daily_revenue) AS REAL) FROM ( \
            SELECT s.SALE_DATE, SUM(s.QUANTITY_SOLD) AS daily_units, \
                   SUM(s.TOTAL_SALE_AMOUNT) AS daily_revenue \
            FROM Sales s JOIN Products p ON p.ITEM_ID = s.ITEM_ID WHERE 1=1",
    );
    velocity
        .filters(&filters.trailing(VELOCITY_DAYS))
        .push(" GROUP BY s.SALE_DATE)");
    let (avg_daily_units, revenue_30d) = velocity
        .fetch_one_cached::<(Option<f64>, Option<f64>)>(db)
        .await?
        .unwrap_or_default();

    let stock_rate = percent(in_stock as f64, total as f64).map(|v| round_to(v, 1));
    Ok(Section::ready(InventoryHealth {
        total_products: total,
        in_stock,
        limited_stock: limited,
        out_of_stock: out,
        avg_price: avg_price.map(|v| round_to(v, 2)),
        stock_rate,
        health: StockHealth::from_stock_rate(stock_rate.unwrap_or(0.0)),
        avg_daily_units: round_to(avg_daily_units.unwrap_or(0.0), 2),
        revenue_30d: round_to(revenue_30d.unwrap_or(0.0), 2),
    }))
}

type StockRow = (String, String, Option<String>, Option<String>, Option<String>, Option<f64>);

async fn stock_lookup(db: &Database, filters: &ProductFilters) -> DbResult<Section<Vec<StockHit>>> {
    let Some(text) = search_text(&filters.lookup) else {
        return Ok(Section::empty("Enter a product name to check stock"));
    };
    let mut q = BoundQuery::new(
        "SELECT p.ITEM_ID, p.PRODUCT_TITLE, p.BRAND, p.SKU, \
                (SELECT a.AVAILABILITY_INDICATOR FROM Availability a \
                 WHERE a.ITEM_ID = p.ITEM_ID LIMIT 1), \
                CAST((SELECT pr.PRODUCT_PRICE FROM Pricing pr WHERE pr.ITEM_ID = p.ITEM_ID \
                      ORDER BY pr.PRICE_SCRAPE_DATE DESC LIMIT 1) AS REAL) \
         FROM Products p WHERE 1=1",
    );
    q.predicate(resolve_search(Column::ProductTitle, Some(text)).as_ref())
        .filters(&filters.catalogue())
        .push(" ORDER BY p.PRODUCT_TITLE LIMIT 5");
    let rows = q
        .fetch_cached::<StockRow>(db)
        .await?;
    let hits = rows
        .iter()
        .map(|(item_id, title, brand, sku, availability, price)| StockHit {
            item_id: item_id.clone(),
            title: title.clone(),
            brand: brand.clone(),
            sku: sku.clone(),
            availability: availability.clone(),
            price: *price,
        })
        .collect();
    Ok(Section::rows(hits, "No products found"))
}

// ============================================================================
// Sellers and profitability
// ============================================================================

async fn top_sellers(db: &Database, filters: &ProductFilters) -> DbResult<Section<Vec<TopSeller>>> {
    let mut q = BoundQuery::new(
        "SELECT p.ITEM_ID, p.PRODUCT_TITLE, p.BRAND, \
                COALESCE(SUM(s.QUANTITY_SOLD), 0) AS units, \
                CAST(SUM(s.TOTAL_SALE_AMOUNT) AS REAL) \
         FROM Sales s JOIN Products p ON p.ITEM_ID = s.ITEM_ID WHERE 1=1",
    );
    q.filters(&filters.trailing(PERFORMANCE_DAYS))
        .push(" GROUP BY p.ITEM_ID ORDER BY units DESC LIMIT 15");
    let rows = q
        .fetch_cached::<(String, String, Option<String>, i64, f64)>(db)
        .await?;
    let sellers = rows
        .iter()
        .map(|(item_id, title, brand, units, revenue)| TopSeller {
            item_id: item_id.clone(),
            title: title.clone(),
            brand: brand.clone(),
            units: *units,
            revenue: round_to(*revenue, 2),
        })
        .collect();
    Ok(Section::rows(sellers, "No sales in the last 90 days"))
}

async fn profitability(
    db: &Database,
    filters: &ProductFilters,
) -> DbResult<Section<ProfitabilityMatrix>> {
    let mut q = BoundQuery::new(
        "SELECT p.ITEM_ID, p.PRODUCT_TITLE, p.BRAND, \
                CAST(SUM(s.TOTAL_SALE_AMOUNT) AS REAL) AS revenue, \
                SUM(s.QUANTITY_SOLD), \
                CAST(AVG(s.SALE_PRICE) AS REAL) \
         FROM Sales s JOIN Products p ON p.ITEM_ID = s.ITEM_ID WHERE 1=1",
    );
    q.filters(&filters.trailing(PERFORMANCE_DAYS)).push(
        " GROUP BY p.ITEM_ID HAVING SUM(s.QUANTITY_SOLD) > 0 \
         ORDER BY revenue DESC LIMIT 100",
    );
    let rows = q
        .fetch_cached::<(String, String, Option<String>, f64, i64, f64)>(db)
        .await?;

    let population: Vec<(f64, f64)> = rows.iter().map(|r| (r.3, r.4 as f64)).collect();
    let Some(thresholds) = QuadrantThresholds::from_population(&population) else {
        return Ok(Section::empty("No product sales in the last 90 days"));
    };

    let products: Vec<ProfitabilityPoint> = rows
        .iter()
        .map(|(item_id, title, brand, revenue, units, avg_price)| ProfitabilityPoint {
            item_id: item_id.clone(),
            title: title.clone(),
            brand: brand.clone(),
            revenue: round_to(*revenue, 2),
            units: *units,
            avg_price: round_to(*avg_price, 2),
            quadrant: thresholds.classify(*revenue, *units as f64),
        })
        .collect();

    let quadrants = ProductQuadrant::ALL
        .iter()
        .map(|q| QuadrantCount {
            quadrant: *q,
            label: q.label().to_string(),
            count: products.iter().filter(|p| p.quadrant == *q).count() as u64,
        })
        .collect();

    Ok(Section::ready(ProfitabilityMatrix {
        thresholds,
        quadrants,
        products,
    }))
}

// ============================================================================
// Pricing
// ============================================================================

/// item, title, brand, avg, min, max, count, sum, sum of squares
type PriceRow = (String, String, Option<String>, f64, f64, f64, i64, f64, f64);

async fn pricing(db: &Database, filters: &ProductFilters) -> DbResult<Section<PriceAnalysis>> {
    let mut q = BoundQuery::new(
        "SELECT p.ITEM_ID, p.PRODUCT_TITLE, p.BRAND, \
                CAST(AVG(s.SALE_PRICE) AS REAL) AS avg_price, \
                CAST(MIN(s.SALE_PRICE) AS REAL), \
                CAST(MAX(s.SALE_PRICE) AS REAL), \
                COUNT(s.SALE_ID), \
                CAST(SUM(s.SALE_PRICE) AS REAL), \
                CAST(SUM(s.SALE_PRICE * s.SALE_PRICE) AS REAL) \
         FROM Sales s JOIN Products p ON p.ITEM_ID = s.ITEM_ID WHERE 1=1",
    );
    q.filters(&filters.trailing(PERFORMANCE_DAYS))
        .push(" GROUP BY p.ITEM_ID ORDER BY avg_price DESC LIMIT 30");
    let rows = q.fetch_cached::<PriceRow>(db).await?;

    let stats: Vec<PriceStat> = rows
        .iter()
        .map(|(item_id, title, brand, avg, min, max, count, sum, sumsq)| PriceStat {
            item_id: item_id.clone(),
            title: title.clone(),
            brand: brand.clone(),
            avg_price: round_to(*avg, 2),
            min_price: *min,
            max_price: *max,
            stddev: stddev_from_sums(*count, *sum, *sumsq).map(|v| round_to(v, 2)),
            sales: *count,
        })
        .collect();
    Ok(price_analysis(stats, filters))
}

/// Summary, histogram and bands cover every product; the list is refined.
fn price_analysis(stats: Vec<PriceStat>, filters: &ProductFilters) -> Section<PriceAnalysis> {
    let prices: Vec<f64> = stats.iter().map(|s| s.avg_price).collect();
    let (Some(avg), Some(mid)) = (mean(&prices), median(&prices)) else {
        return Section::empty("No price data for the last 90 days");
    };
    let summary = PriceSummary {
        highest: prices.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        lowest: prices.iter().copied().fold(f64::INFINITY, f64::min),
        mean: round_to(avg, 2),
        median: round_to(mid, 2),
    };
    let histogram = histogram(&prices, HISTOGRAM_BINS);
    let bands = PriceBand::counts(prices.iter().copied());

    let search = search_text(&filters.price_search);
    let refined: Vec<PriceStat> = stats
        .into_iter()
        .filter(|s| search.is_none_or(|t| matches_text(&s.title, t)))
        .filter(|s| filters.price_min.is_none_or(|min| s.avg_price >= min))
        .filter(|s| filters.price_max.is_none_or(|max| s.avg_price <= max))
        .collect();
    let matched = refined.len() as u64;
    let products = refined.into_iter().take(filters.display_limit()).collect();

    Section::ready(PriceAnalysis {
        summary,
        histogram,
        bands,
        products,
        matched,
    })
}

// ============================================================================
// Reviews
// ============================================================================

async fn reviews(db: &Database, filters: &ProductFilters) -> DbResult<Section<ReviewAnalysis>> {
    let mut q = BoundQuery::new(
        "SELECT p.ITEM_ID, p.PRODUCT_TITLE, p.BRAND, \
                CAST(AVG(r.ITEM_REVIEW_RATING) AS REAL) AS avg_rating, \
                COALESCE(SUM(r.ITEM_REVIEW_COUNT), 0) AS total_reviews, \
                CAST((SELECT AVG(pr.PRODUCT_PRICE) FROM Pricing pr \
                      WHERE pr.ITEM_ID = p.ITEM_ID) AS REAL) \
         FROM Reviews r JOIN Products p ON p.ITEM_ID = r.ITEM_ID WHERE 1=1",
    );
    q.filters(&filters.catalogue()).push(
        " GROUP BY p.ITEM_ID HAVING AVG(r.ITEM_REVIEW_RATING) IS NOT NULL \
         ORDER BY avg_rating DESC, total_reviews DESC",
    );
    let rows = q
        .fetch_cached::<(String, String, Option<String>, f64, i64, Option<f64>)>(db)
        .await?;
    let stats = rows
        .iter()
        .map(|(item_id, title, brand, rating, reviews, price)| ReviewStat {
            item_id: item_id.clone(),
            title: title.clone(),
            brand: brand.clone(),
            avg_rating: round_to(*rating, 2),
            total_reviews: *reviews,
            avg_price: price.map(|p| round_to(p, 2)),
        })
        .collect();
    Ok(review_analysis(stats, filters))
}

/// `stats` arrive ordered by rating then review count, best first.
fn review_analysis(stats: Vec<ReviewStat>, filters: &ProductFilters) -> Section<ReviewAnalysis> {
    let ratings: Vec<f64> = stats.iter().map(|s| s.avg_rating).collect();
    let counts: Vec<f64> = stats.iter().map(|s| s.total_reviews as f64).collect();
    let (Some(overall), Some(count_median)) = (mean(&ratings), median(&counts)) else {
        return Section::empty("No review data available");
    };

    let summary = ReviewSummary {
        overall_avg: round_to(overall, 2),
        highest: ratings.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        products: stats.len() as u64,
        highly_rated: ratings.iter().filter(|r| **r >= HIGH_RATING).count() as u64,
        poorly_rated: ratings.iter().filter(|r| **r < LOW_RATING).count() as u64,
        total_reviews: stats.iter().map(|s| s.total_reviews).sum(),
        star_performers: stats
            .iter()
            .filter(|s| s.avg_rating >= HIGH_RATING && s.total_reviews as f64 >= count_median)
            .count() as u64,
    };

    let top_rated = stats.iter().take(REVIEW_HIGHLIGHTS).cloned().collect();
    let lowest_rated = stats.iter().rev().take(REVIEW_HIGHLIGHTS).cloned().collect();

    let search = search_text(&filters.review_search);
    let matching = stats
        .iter()
        .filter(|s| {
            search.is_none_or(|t| {
                matches_text(&s.title, t) || s.brand.as_deref().is_some_and(|b| matches_text(b, t))
            })
        })
        .filter(|s| s.avg_rating >= filters.min_rating && s.total_reviews >= filters.min_reviews)
        .cloned()
        .collect();

    Section::ready(ReviewAnalysis {
        summary,
        bands: RatingBand::counts(ratings.iter().copied()),
        top_rated,
        lowest_rated,
        matching,
    })
}
