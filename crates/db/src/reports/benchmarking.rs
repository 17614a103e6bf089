// crates/db/src/reports/benchmarking.rs
//! Competitive benchmarking: our prices against scraped competitor prices,
//! a single competitor's price history, and the benchmark catalogue tree.

use std::cmp::Ordering;

use retail_hub_core::filters::{resolve_search, Choice, Column, DateRange, FilterSet, MultiSelect};
use retail_hub_core::reports::{
    BenchmarkReport, CategoryPrice, CompetitorAnalysis, CompetitorKpis, CompetitorTrendPoint,
    HierarchyNode, PriceComparison, PriceComparisonRow, Section, StorePrice,
};
use retail_hub_core::segments::{PricePosition, PricingInsight};
use retail_hub_core::stats::{mean, round_to, sample_stddev};

use super::settle;
use crate::options::{filter_options, OptionSource};
use crate::query::BoundQuery;
use crate::{Database, DbResult};

const COMPETITOR_FROM: &str = " FROM Benchmark b \
     JOIN Pricing pr ON pr.BENCHMARK_ID = b.BENCHMARK_ID \
     WHERE pr.BENCHMARK_SITE_PRICE IS NOT NULL";

#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkFilters {
    pub brand: Choice,
    pub position: Option<PricePosition>,
    pub search: Option<String>,
    /// `All` falls back to the first competitor brand on file.
    pub competitor: Choice,
    pub stores: MultiSelect,
    pub range: DateRange,
}

pub async fn benchmark_report(db: &Database, filters: &BenchmarkFilters) -> BenchmarkReport {
    tracing::debug!(
        position = ?filters.position,
        competitor = ?filters.competitor.value(),
        "building benchmark report"
    );
    BenchmarkReport {
        comparison: settle("price comparison", price_comparison(db, filters).await),
        competitor: settle("competitor analysis", competitor_analysis(db, filters).await),
        hierarchy: settle("benchmark categories", hierarchy(db).await),
    }
}

// ============================================================================
// Price comparison
// ============================================================================

type ComparisonRow = (String, String, Option<String>, Option<String>, f64, Option<f64>, f64);

async fn price_comparison(
    db: &Database,
    filters: &BenchmarkFilters,
) -> DbResult<Section<PriceComparison>> {
    let mut q = BoundQuery::new(
        "SELECT p.ITEM_ID, p.PRODUCT_TITLE, p.BRAND, b.BENCHMARK_STORE, \
                CAST(pr.PRODUCT_PRICE AS REAL), \
                CAST(pr.BENCHMARK_BASE_PRICE AS REAL), \
                CAST(pr.BENCHMARK_SITE_PRICE AS REAL) \
         FROM Products p \
         JOIN Pricing pr ON pr.ITEM_ID = p.ITEM_ID \
         JOIN Benchmark b ON b.BENCHMARK_ID = pr.BENCHMARK_ID \
         WHERE pr.BENCHMARK_SITE_PRICE IS NOT NULL AND pr.PRODUCT_PRICE IS NOT NULL",
    );
    q.filters(
        &FilterSet::new()
            .with(filters.brand.resolve(Column::Brand))
            .with(resolve_search(Column::ProductTitle, filters.search.as_deref())),
    );
    let rows = q.fetch_cached::<ComparisonRow>(db).await?;

    let rows: Vec<PriceComparisonRow> = rows
        .iter()
        .map(|(item_id, title, brand, store, ours, base, theirs)| comparison_row(
            item_id, title, brand, store, *ours, *base, *theirs,
        ))
        .filter(|r| filters.position.is_none_or(|p| r.position == p))
        .collect();
    Ok(summarize_comparison(rows))
}

fn comparison_row(
    item_id: &str,
    title: &str,
    brand: &Option<String>,
    store: &Option<String>,
    ours: f64,
    base: Option<f64>,
    theirs: f64,
) -> PriceComparisonRow {
    let difference = ours - theirs;
    let difference_pct = if theirs == 0.0 {
        None
    } else {
        Some(round_to(difference / theirs * 100.0, 2))
    };
    PriceComparisonRow {
        item_id: item_id.to_string(),
        title: title.to_string(),
        brand: brand.clone(),
        store: store.clone(),
        our_price: ours,
        base_price: base,
        competitor_price: theirs,
        difference: round_to(difference, 2),
        difference_pct,
        position: PricePosition::classify(ours, theirs),
    }
}

/// Counts and the insight describe the rows left after every refinement.
fn summarize_comparison(mut rows: Vec<PriceComparisonRow>) -> Section<PriceComparison> {
    if rows.is_empty() {
        return Section::empty("No products match the selected comparison filters");
    }
    rows.sort_by(|a, b| match (a.difference_pct, b.difference_pct) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    let count = |p: PricePosition| rows.iter().filter(|r| r.position == p).count() as u64;
    let pcts: Vec<f64> = rows.iter().filter_map(|r| r.difference_pct).collect();
    let avg_difference_pct = mean(&pcts).map(|v| round_to(v, 2));
    let parity_max = rows
        .iter()
        .map(|r| r.our_price.max(r.competitor_price))
        .fold(0.0, f64::max);

    Section::ready(PriceComparison {
        above: count(PricePosition::Above),
        below: count(PricePosition::Below),
        at: count(PricePosition::At),
        avg_difference_pct,
        insight: avg_difference_pct.map(PricingInsight::from_mean_difference_pct),
        parity_max,
        rows,
    })
}

// ============================================================================
// Competitor analysis
// ============================================================================

async fn competitor_analysis(
    db: &Database,
    filters: &BenchmarkFilters,
) -> DbResult<Section<CompetitorAnalysis>> {
    let competitor = match filters.competitor.value() {
        Some(c) => c.to_string(),
        None => match filter_options(db, OptionSource::CompetitorBrands).await?.first() {
            Some(first) => first.clone(),
            None => return Ok(Section::empty("No competitor brands available")),
        },
    };
    let scope = FilterSet::new()
        .with(Choice::Value(competitor.clone()).resolve(Column::CompetitorBrand))
        .with(filters.stores.resolve(Column::CompetitorStore))
        .with(Some(filters.range.resolve(Column::ScrapeDate)));
    let scoped = |select: &str, tail: &str| {
        let mut q = BoundQuery::new(select);
        q.push(COMPETITOR_FROM).filters(&scope).push(tail);
        q
    };

    let trend = scoped(
        "SELECT pr.PRICE_SCRAPE_DATE, COALESCE(b.BENCHMARK_STORE, 'Unknown') AS store, \
                CAST(AVG(pr.BENCHMARK_SITE_PRICE) AS REAL), \
                CAST(MIN(pr.BENCHMARK_SITE_PRICE) AS REAL), \
                CAST(MAX(pr.BENCHMARK_SITE_PRICE) AS REAL), \
                COUNT(*)",
        " GROUP BY pr.PRICE_SCRAPE_DATE, store ORDER BY pr.PRICE_SCRAPE_DATE, store",
    )
    .fetch_cached::<(String, String, f64, f64, f64, i64)>(db)
    .await?;
    if trend.is_empty() {
        return Ok(Section::empty(format!(
            "No pricing data for {competitor} in the selected stores and dates"
        )));
    }
    let trend: Vec<CompetitorTrendPoint> = trend
        .iter()
        .map(|(date, store, avg, min, max, n)| CompetitorTrendPoint {
            date: date.clone(),
            store: store.clone(),
            avg_price: round_to(*avg, 2),
            min_price: *min,
            max_price: *max,
            observations: *n,
        })
        .collect();

    let tracked = scoped("SELECT COUNT(DISTINCT b.BENCHMARK_ITEM_SUB_DESC)", "")
        .fetch_one_cached::<(i64,)>(db)
        .await?
        .map(|(n,)| n)
        .unwrap_or(0);

    let categories = scoped(
        "SELECT COALESCE(b.BENCHMARK_CATG, 'Unknown') AS category, \
                CAST(AVG(pr.BENCHMARK_SITE_PRICE) AS REAL) AS avg_price, COUNT(*)",
        " GROUP BY category ORDER BY avg_price DESC",
    )
    .fetch_cached::<(String, f64, i64)>(db)
    .await?
    .iter()
    .map(|(category, avg, n)| CategoryPrice {
        category: category.clone(),
        avg_price: round_to(*avg, 2),
        products: *n,
    })
    .collect();

    let stores = scoped(
        "SELECT COALESCE(b.BENCHMARK_STORE, 'Unknown') AS store, \
                CAST(AVG(pr.BENCHMARK_SITE_PRICE) AS REAL), \
                CAST(MIN(pr.BENCHMARK_SITE_PRICE) AS REAL), \
                CAST(MAX(pr.BENCHMARK_SITE_PRICE) AS REAL), COUNT(*)",
        " GROUP BY store ORDER BY store",
    )
    .fetch_cached::<(String, f64, f64, f64, i64)>(db)
    .await?
    .iter()
    .map(|(store, avg, min, max, n)| StorePrice {
        store: store.clone(),
        avg_price: round_to(*avg, 2),
        min_price: *min,
        max_price: *max,
        products: *n,
    })
    .collect();

    Ok(Section::ready(CompetitorAnalysis {
        competitor,
        kpis: competitor_kpis(&trend, tracked),
        trend,
        categories,
        stores,
    }))
}

/// KPIs over the (date, store) series; volatility is the spread of its averages.
fn competitor_kpis(trend: &[CompetitorTrendPoint], products_tracked: i64) -> CompetitorKpis {
    let averages: Vec<f64> = trend.iter().map(|t| t.avg_price).collect();
    CompetitorKpis {
        avg_price: round_to(mean(&averages).unwrap_or(0.0), 2),
        min_price: trend.iter().map(|t| t.min_price).fold(f64::INFINITY, f64::min),
        max_price: trend.iter().map(|t| t.max_price).fold(f64::NEG_INFINITY, f64::max),
        products_tracked,
        volatility: sample_stddev(&averages).map(|v| round_to(v, 2)),
    }
}

// ============================================================================
// Hierarchy
// ============================================================================

async fn hierarchy(db: &Database) -> DbResult<Section<Vec<HierarchyNode>>> {
    let mut q = BoundQuery::new(
        "SELECT COALESCE(b.BENCHMARK_CATG, 'Unknown') AS category, \
                COALESCE(b.BENCHMARK_SUBCATG, 'Unknown') AS subcategory, \
                COALESCE(b.BENCHMARK_STORE, 'Unknown') AS store, \
                COUNT(DISTINCT b.BENCHMARK_ID) AS products, \
                CAST(AVG(pr.BENCHMARK_SITE_PRICE) AS REAL)",
    );
    q.push(COMPETITOR_FROM).push(
        " GROUP BY category, subcategory, store \
         ORDER BY products DESC, category, subcategory, store",
    );
    let rows = q
        .fetch_cached::<(String, String, String, i64, f64)>(db)
        .await?;
    let nodes = rows
        .iter()
        .map(|(category, subcategory, store, products, avg)| HierarchyNode {
            category: category.clone(),
            subcategory: subcategory.clone(),
            store: store.clone(),
            products: *products,
            avg_price: round_to(*avg, 2),
        })
        .collect();
    Ok(Section::rows(nodes, "No benchmark category data available"))
}
