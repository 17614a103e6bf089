// crates/db/src/reports/customers.rs
//! Customer insights: payment mix and RFM-style segmentation.

use chrono::NaiveDate;
use retail_hub_core::filters::{Column, DateRange, FilterSet};
use retail_hub_core::reports::{
    ClvInsights, CustomerProfile, CustomerReport, PaymentMethodStat, PaymentMix, Section,
    SegmentSummary, Segmentation,
};
use retail_hub_core::segments::{CustomerSegment, SegmentThresholds};
use retail_hub_core::stats::{mean, percent, ratio, round_to, top_fraction_sum};

use super::{period, settle};
use crate::query::BoundQuery;
use crate::{Database, DbResult};

const TOP_CUSTOMERS: usize = 20;
const TOP_FRACTION: f64 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct CustomerFilters {
    pub range: DateRange,
    pub min_spending: f64,
    pub min_frequency: i64,
    /// Empty keeps every segment.
    pub segments: Vec<CustomerSegment>,
    /// Reference date for recency.
    pub as_of: NaiveDate,
}

impl CustomerFilters {
    pub fn new(range: DateRange, as_of: NaiveDate) -> Self {
        Self {
            range,
            min_spending: 0.0,
            min_frequency: 0,
            segments: Vec::new(),
            as_of,
        }
    }

    fn keeps(&self, c: &CustomerProfile) -> bool {
        c.total_spending >= self.min_spending
            && c.frequency >= self.min_frequency
            && (self.segments.is_empty() || self.segments.contains(&c.segment))
    }
}

pub async fn customer_report(db: &Database, filters: &CustomerFilters) -> CustomerReport {
    tracing::debug!(
        start = %filters.range.start,
        end = %filters.range.end,
        "building customer report"
    );
    CustomerReport {
        period: period(&filters.range),
        payments: settle("payment methods", payments(db, filters).await),
        segmentation: settle("customer segmentation", segmentation(db, filters).await),
    }
}

async fn payments(db: &Database, filters: &CustomerFilters) -> DbResult<Section<PaymentMix>> {
    let mut q = BoundQuery::new(
        "SELECT COALESCE(s.PAYMENT_METHOD, 'Unknown') AS method, \
                COUNT(s.SALE_ID) AS transactions, \
                CAST(SUM(s.TOTAL_SALE_AMOUNT) AS REAL), \
                CAST(AVG(s.TOTAL_SALE_AMOUNT) AS REAL) \
         FROM Sales s WHERE 1=1",
    );
    q.filters(&FilterSet::new().with(Some(filters.range.resolve(Column::SaleDate))))
        .push(" GROUP BY method ORDER BY transactions DESC, method");
    let rows = q.fetch_cached::<(String, i64, f64, f64)>(db).await?;
    if rows.is_empty() {
        return Ok(Section::empty("No transactions in the selected period"));
    }

    let methods: Vec<PaymentMethodStat> = rows
        .iter()
        .map(|(method, transactions, revenue, avg)| PaymentMethodStat {
            method: method.clone(),
            transactions: *transactions,
            revenue: round_to(*revenue, 2),
            avg_transaction: round_to(*avg, 2),
        })
        .collect();
    let total: i64 = methods.iter().map(|m| m.transactions).sum();
    let top = methods.first();

    Ok(Section::ready(PaymentMix {
        top_method: top.map(|m| m.method.clone()),
        top_share_pct: top
            .and_then(|m| percent(m.transactions as f64, total as f64))
            .map(|v| round_to(v, 1)),
        methods,
    }))
}

/// customer, frequency, spend, aov, last purchase, days since
type CustomerRow = (i64, i64, f64, f64, String, i64);

async fn segmentation(db: &Database, filters: &CustomerFilters) -> DbResult<Section<Segmentation>> {
    let mut q = BoundQuery::new(
        "SELECT s.CUSTOMER_ID, \
                COUNT(DISTINCT s.SALE_ID), \
                CAST(SUM(s.TOTAL_SALE_AMOUNT) AS REAL) AS spend, \
                CAST(AVG(s.TOTAL_SALE_AMOUNT) AS REAL), \
                MAX(s.SALE_DATE), \
                CAST(julianday(",
    );
    q.push_bind(filters.as_of)
        .push(") - julianday(MAX(s.SALE_DATE)) AS INTEGER) FROM Sales s WHERE 1=1")
        .filters(&FilterSet::new().with(Some(filters.range.resolve(Column::SaleDate))))
        .push(" GROUP BY s.CUSTOMER_ID ORDER BY spend DESC, s.CUSTOMER_ID");
    let rows = q.fetch_cached::<CustomerRow>(db).await?;
    Ok(segment(&rows, filters))
}

fn segment(rows: &[CustomerRow], filters: &CustomerFilters) -> Section<Segmentation> {
    let population: Vec<(f64, f64)> = rows.iter().map(|r| (r.1 as f64, r.2)).collect();
    let Some(thresholds) = SegmentThresholds::from_population(&population) else {
        return Section::empty("No customer data available");
    };

    let customers: Vec<CustomerProfile> = rows
        .iter()
        .map(|(id, frequency, spend, aov, last, days)| CustomerProfile {
            customer_id: *id,
            frequency: *frequency,
            total_spending: round_to(*spend, 2),
            aov: round_to(*aov, 2),
            last_purchase: last.clone(),
            days_since_last_purchase: *days,
            segment: thresholds.classify(*frequency as f64, *spend),
        })
        .collect();

    let segments = CustomerSegment::ALL
        .iter()
        .map(|segment| {
            let members: Vec<&CustomerProfile> =
                customers.iter().filter(|c| c.segment == *segment).collect();
            let revenue: f64 = members.iter().map(|c| c.total_spending).sum();
            SegmentSummary {
                segment: *segment,
                label: segment.label().to_string(),
                customers: members.len() as u64,
                revenue: round_to(revenue, 2),
                revenue_per_customer: ratio(revenue, members.len() as f64).map(|v| round_to(v, 2)),
            }
        })
        .collect();

    let refined: Vec<CustomerProfile> = customers.into_iter().filter(|c| filters.keeps(c)).collect();

    Section::ready(Segmentation {
        thresholds,
        segments,
        matched: refined.len() as u64,
        clv: clv(&refined),
        top_customers: refined.into_iter().take(TOP_CUSTOMERS).collect(),
    })
}

fn clv(customers: &[CustomerProfile]) -> Option<ClvInsights> {
    let values: Vec<f64> = customers.iter().map(|c| c.total_spending).collect();
    let avg = mean(&values)?;
    let total: f64 = values.iter().sum();
    let (top_n, top_value) = top_fraction_sum(&values, TOP_FRACTION);
    Some(ClvInsights {
        avg_value: round_to(avg, 2),
        top_decile_customers: top_n as u64,
        top_decile_value: round_to(top_value, 2),
        top_decile_share_pct: percent(top_value, total).map(|v| round_to(v, 1)),
        total_value: round_to(total, 2),
    })
}
