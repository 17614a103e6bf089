// crates/db/src/reports/mod.rs
//! The four report builders.
//!
//! Builders never fail as a whole: each section settles independently into
//! `Section::Ready`, `Section::Empty` or `Section::Failed`.

pub mod benchmarking;
pub mod customers;
pub mod products;
pub mod sales;

pub use benchmarking::{benchmark_report, BenchmarkFilters};
pub use customers::{customer_report, CustomerFilters};
pub use products::{product_report, ProductFilters};
pub use sales::{sales_report, SalesFilters};

use chrono::NaiveDate;
use retail_hub_core::filters::DateRange;
use retail_hub_core::reports::{Period, Section};

use crate::DbResult;

/// Turn a section's query result into its payload, logging failures.
pub(crate) fn settle<T>(section: &str, result: DbResult<Section<T>>) -> Section<T> {
    match result {
        Ok(section) => section,
        Err(e) => {
            tracing::warn!(section, error = %e, "report section failed");
            Section::failed(format!("Could not load {section}: {e}"))
        }
    }
}

pub(crate) fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn period(range: &DateRange) -> Period {
    let previous = range.previous();
    Period {
        start: iso(range.start),
        end: iso(range.end),
        previous_start: iso(previous.start),
        previous_end: iso(previous.end),
        days: range.period_days(),
    }
}
