// crates/db/src/reports/sales.rs
//! Sales performance: KPIs against the previous period, daily trend,
//! weekday mix, and top categories, brands, products and merchants.

use chrono::{Datelike, NaiveDate, Weekday};
use retail_hub_core::filters::{Choice, Column, DateRange, FilterSet, CATEGORY_EXPR};
use retail_hub_core::reports::{
    BrandSales, CategorySales, Comparison, DailyPoint, MerchantBreakdown, MerchantSales,
    ProductSales, SalesKpis, SalesReport, Section, WeekdayTotal,
};
use retail_hub_core::stats::{
    moving_average, percent, ratio, round_to, weekday_name, MOVING_AVERAGE_WINDOW,
};

use super::{period, settle};
use crate::query::BoundQuery;
use crate::{Database, DbResult};

const SALES_JOINS: &str = " FROM Sales s \
     JOIN Products p ON p.ITEM_ID = s.ITEM_ID \
     JOIN Third_Party_Merchants m ON m.MERCHANT_ID = s.MERCHANT_ID";

const NO_SALES: &str = "No sales data available for the selected period";

#[derive(Debug, Clone, PartialEq)]
pub struct SalesFilters {
    pub range: DateRange,
    pub brand: Choice,
    pub merchant: Choice,
}

impl SalesFilters {
    fn scope(&self, range: &DateRange, brand: bool, merchant: bool) -> FilterSet {
        let mut set = FilterSet::new().with(Some(range.resolve(Column::SaleDate)));
        if brand {
            set.push(self.brand.resolve(Column::Brand));
        }
        if merchant {
            set.push(self.merchant.resolve(Column::MerchantName));
        }
        set
    }

    fn all(&self) -> FilterSet {
        self.scope(&self.range, true, true)
    }
}

fn sales_query(select: &str, extra_joins: &str, filters: &FilterSet, tail: &str) -> BoundQuery {
    let mut q = BoundQuery::new(select);
    q.push(SALES_JOINS).push(extra_joins).push(" WHERE 1=1");
    q.filters(filters).push(tail);
    q
}

pub async fn sales_report(db: &Database, filters: &SalesFilters) -> SalesReport {
    tracing::debug!(
        start = %filters.range.start,
        end = %filters.range.end,
        "building sales report"
    );

    let kpis = settle("KPIs", kpis(db, filters).await);
    let (daily_trend, weekdays) = match daily_trend(db, filters).await {
        Ok(points) => {
            let weekdays = weekday_totals(&points);
            (Section::rows(points, NO_SALES), weekdays)
        }
        Err(e) => (
            settle("daily trend", Err(e)),
            Section::failed("Daily trend unavailable"),
        ),
    };

    SalesReport {
        period: period(&filters.range),
        kpis,
        daily_trend,
        weekdays,
        top_categories: settle("category performance", top_categories(db, filters).await),
        top_brands: settle("brand performance", top_brands(db, filters).await),
        top_products: settle("top products", top_products(db, filters).await),
        merchants: settle("merchant performance", merchants(db, filters).await),
    }
}

/// revenue, orders, customers, aov, units, discounts
type TotalsRow = (f64, i64, i64, f64, i64, f64);

async fn totals(db: &Database, filters: &SalesFilters, range: &DateRange) -> DbResult<TotalsRow> {
    let q = sales_query(
        "SELECT CAST(COALESCE(SUM(s.TOTAL_SALE_AMOUNT), 0) AS REAL), \
                COUNT(DISTINCT s.SALE_ID), \
                COUNT(DISTINCT s.CUSTOMER_ID), \
                CAST(COALESCE(AVG(s.TOTAL_SALE_AMOUNT), 0) AS REAL), \
                COALESCE(SUM(s.QUANTITY_SOLD), 0), \
                CAST(COALESCE(SUM(s.DISCOUNT_APPLIED), 0) AS REAL)",
        "",
        &filters.scope(range, true, true),
        "",
    );
    Ok(q
        .fetch_one_cached::<TotalsRow>(db)
        .await?
        .unwrap_or((0.0, 0, 0, 0.0, 0, 0.0)))
}

async fn kpis(db: &Database, filters: &SalesFilters) -> DbResult<Section<SalesKpis>> {
    let current = totals(db, filters, &filters.range).await?;
    if current.1 == 0 {
        return Ok(Section::empty(NO_SALES));
    }
    let previous = totals(db, filters, &filters.range.previous()).await?;

    let (revenue, orders, customers, aov, units, discounts) = current;
    let (orders_f, customers_f) = (orders as f64, customers as f64);
    let two_dp = |v: f64| round_to(v, 2);

    Ok(Section::ready(SalesKpis {
        revenue: Comparison::new(revenue, previous.0),
        orders: Comparison::new(orders_f, previous.1 as f64),
        customers: Comparison::new(customers_f, previous.2 as f64),
        aov: Comparison::new(aov, previous.3),
        units: Comparison::new(units as f64, previous.4 as f64),
        discounts: Comparison::new(discounts, previous.5),
        conversion_rate: percent(orders_f, customers_f).map(two_dp),
        avg_discount: ratio(discounts, orders_f).map(two_dp),
        revenue_per_customer: ratio(revenue, customers_f).map(two_dp),
        discount_rate: percent(discounts, revenue).map(two_dp),
    }))
}

async fn daily_trend(db: &Database, filters: &SalesFilters) -> DbResult<Vec<DailyPoint>> {
    let q = sales_query(
        "SELECT s.SALE_DATE, \
                CAST(SUM(s.TOTAL_SALE_AMOUNT) AS REAL), \
                COUNT(DISTINCT s.SALE_ID), \
                CAST(AVG(s.TOTAL_SALE_AMOUNT) AS REAL)",
        "",
        &filters.all(),
        " GROUP BY s.SALE_DATE ORDER BY s.SALE_DATE",
    );
    let rows = q.fetch_cached::<(String, f64, i64, f64)>(db).await?;

    let revenue: Vec<f64> = rows.iter().map(|r| r.1).collect();
    let orders: Vec<f64> = rows.iter().map(|r| r.2 as f64).collect();
    let revenue_ma = moving_average(&revenue, MOVING_AVERAGE_WINDOW);
    let orders_ma = moving_average(&orders, MOVING_AVERAGE_WINDOW);

    Ok(rows
        .iter()
        .enumerate()
        .map(|(i, (date, revenue, orders, aov))| DailyPoint {
            date: date.clone(),
            revenue: *revenue,
            orders: *orders,
            aov: round_to(*aov, 2),
            revenue_ma7: round_to(revenue_ma[i], 2),
            orders_ma7: round_to(orders_ma[i], 2),
        })
        .collect())
}

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Monday-first totals over the daily series; days without sales are zero.
fn weekday_totals(points: &[DailyPoint]) -> Section<Vec<WeekdayTotal>> {
    if points.is_empty() {
        return Section::empty(NO_SALES);
    }
    let mut totals: Vec<WeekdayTotal> = WEEK
        .iter()
        .map(|d| WeekdayTotal {
            day: weekday_name(*d).to_string(),
            revenue: 0.0,
            orders: 0,
        })
        .collect();
    for p in points {
        let Ok(date) = NaiveDate::parse_from_str(&p.date, "%Y-%m-%d") else {
            continue;
        };
        let slot = &mut totals[date.weekday().num_days_from_monday() as usize];
        slot.revenue += p.revenue;
        slot.orders += p.orders;
    }
    for t in &mut totals {
        t.revenue = round_to(t.revenue, 2);
    }
    Section::ready(totals)
}

async fn top_categories(db: &Database, filters: &SalesFilters) -> DbResult<Section<Vec<CategorySales>>> {
    let select = format!(
        "SELECT COALESCE({CATEGORY_EXPR}, 'Uncategorized') AS category, \
                CAST(SUM(s.TOTAL_SALE_AMOUNT) AS REAL) AS revenue, \
                COUNT(DISTINCT s.SALE_ID), \
                COALESCE(SUM(s.QUANTITY_SOLD), 0)"
    );
    let q = sales_query(
        &select,
        "",
        &filters.all(),
        " GROUP BY category ORDER BY revenue DESC LIMIT 10",
    );
    let rows = q.fetch_cached::<(String, f64, i64, i64)>(db).await?;
    let categories = rows
        .iter()
        .map(|(category, revenue, orders, units)| CategorySales {
            category: category.clone(),
            revenue: *revenue,
            orders: *orders,
            units: *units,
            aov: ratio(*revenue, *orders as f64).map(|v| round_to(v, 2)).unwrap_or(0.0),
        })
        .collect();
    Ok(Section::rows(categories, "No category data available"))
}

/// Brands ignore the brand selector so the share chart stays meaningful.
async fn top_brands(db: &Database, filters: &SalesFilters) -> DbResult<Section<Vec<BrandSales>>> {
    let q = sales_query(
        "SELECT COALESCE(p.BRAND, 'Unknown') AS brand, \
                CAST(SUM(s.TOTAL_SALE_AMOUNT) AS REAL) AS revenue, \
                COUNT(DISTINCT s.SALE_ID), \
                COALESCE(SUM(s.QUANTITY_SOLD), 0)",
        "",
        &filters.scope(&filters.range, false, true),
        " GROUP BY brand ORDER BY revenue DESC LIMIT 10",
    );
    let rows = q.fetch_cached::<(String, f64, i64, i64)>(db).await?;
    let brands = rows
        .iter()
        .map(|(brand, revenue, orders, units)| BrandSales {
            brand: brand.clone(),
            revenue: *revenue,
            orders: *orders,
            units: *units,
        })
        .collect();
    Ok(Section::rows(brands, "No brand data available"))
}

type ProductRow = (String, String, Option<String>, f64, i64, i64, f64, f64);

async fn top_products(db: &Database, filters: &SalesFilters) -> DbResult<Section<Vec<ProductSales>>> {
    // Reviews are averaged per item first so the join cannot multiply sales rows.
    let q = sales_query(
        "SELECT p.ITEM_ID, p.PRODUCT_TITLE, p.BRAND, \
                CAST(SUM(s.TOTAL_SALE_AMOUNT) AS REAL) AS revenue, \
                COALESCE(SUM(s.QUANTITY_SOLD), 0), \
                COUNT(DISTINCT s.SALE_ID), \
                CAST(AVG(s.SALE_PRICE) AS REAL), \
                CAST(COALESCE(MAX(rv.avg_rating), 0) AS REAL)",
        " LEFT JOIN (SELECT ITEM_ID, AVG(ITEM_REVIEW_RATING) AS avg_rating \
                     FROM Reviews GROUP BY ITEM_ID) rv ON rv.ITEM_ID = p.ITEM_ID",
        &filters.all(),
        " GROUP BY p.ITEM_ID ORDER BY revenue DESC LIMIT 20",
    );
    let rows = q.fetch_cached::<ProductRow>(db).await?;
    let products = rows
        .iter()
        .map(|(item_id, title, brand, revenue, units, orders, avg_price, avg_rating)| ProductSales {
            item_id: item_id.clone(),
            title: title.clone(),
            brand: brand.clone(),
            revenue: *revenue,
            units: *units,
            orders: *orders,
            avg_price: round_to(*avg_price, 2),
            avg_rating: round_to(*avg_rating, 2),
        })
        .collect();
    Ok(Section::rows(products, "No product data available"))
}

/// Merchants ignore the merchant selector; every merchant is compared.
async fn merchants(db: &Database, filters: &SalesFilters) -> DbResult<Section<MerchantBreakdown>> {
    let q = sales_query(
        "SELECT m.THIRD_PARTY_MERCHANT_NAME, \
                CAST(SUM(s.TOTAL_SALE_AMOUNT) AS REAL) AS revenue, \
                COUNT(DISTINCT s.SALE_ID), \
                CAST(AVG(s.TOTAL_SALE_AMOUNT) AS REAL), \
                COALESCE(SUM(s.QUANTITY_SOLD), 0), \
                CAST(COALESCE(SUM(s.DISCOUNT_APPLIED), 0) AS REAL)",
        "",
        &filters.scope(&filters.range, true, false),
        " GROUP BY m.THIRD_PARTY_MERCHANT_NAME ORDER BY revenue DESC",
    );
    let rows = q.fetch_cached::<(String, f64, i64, f64, i64, f64)>(db).await?;
    if rows.is_empty() {
        return Ok(Section::empty("No merchant data available"));
    }
    let merchants: Vec<MerchantSales> = rows
        .iter()
        .map(|(merchant, revenue, orders, aov, units, discounts)| MerchantSales {
            merchant: merchant.clone(),
            revenue: *revenue,
            orders: *orders,
            aov: round_to(*aov, 2),
            units: *units,
            discounts: *discounts,
            discount_rate: percent(*discounts, *revenue).map(|v| round_to(v, 2)),
        })
        .collect();
    Ok(Section::ready(MerchantBreakdown {
        top_merchant: merchants.first().map(|m| m.merchant.clone()),
        merchants,
    }))
}
