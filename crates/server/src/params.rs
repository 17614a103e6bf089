// crates/server/src/params.rs
//! Query-string filters shared by the report and page endpoints.
//!
//! Every field arrives as text so malformed values become JSON 400s instead
//! of extractor rejections.

use std::str::FromStr;

use chrono::NaiveDate;
use retail_hub_core::filters::{Choice, DateRange, FilterError, MultiSelect, ALL_SENTINEL};
use retail_hub_core::segments::{CustomerSegment, PricePosition};
use retail_hub_db::reports::products::DEFAULT_PRICE_LIMIT;
use retail_hub_db::reports::{BenchmarkFilters, CustomerFilters, ProductFilters, SalesFilters};
use serde::Deserialize;

/// Default look-back windows, in days, when no date range is selected.
pub const SALES_WINDOW_DAYS: i64 = 90;
pub const CUSTOMER_WINDOW_DAYS: i64 = 180;
pub const COMPETITOR_WINDOW_DAYS: i64 = 90;
const LONGEST_WINDOW_DAYS: i64 = CUSTOMER_WINDOW_DAYS;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParams {
    pub start: Option<String>,
    pub end: Option<String>,
    /// Overrides "today" for default windows.
    pub as_of: Option<String>,
    pub brand: Option<String>,
    pub merchant: Option<String>,
    pub category: Option<String>,
    pub lookup: Option<String>,
    pub price_search: Option<String>,
    pub price_min: Option<String>,
    pub price_max: Option<String>,
    pub price_limit: Option<String>,
    pub review_search: Option<String>,
    pub min_rating: Option<String>,
    pub min_reviews: Option<String>,
    pub position: Option<String>,
    pub search: Option<String>,
    pub competitor: Option<String>,
    /// Comma-separated store names.
    pub stores: Option<String>,
    pub min_spending: Option<String>,
    pub min_frequency: Option<String>,
    /// Comma-separated segment names.
    pub segments: Option<String>,
}

fn blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn text(raw: &Option<String>) -> Option<String> {
    blank(raw.as_deref()).map(str::to_owned)
}

/// Parse an optional value, naming the field on failure.
fn parse<T: FromStr>(field: &'static str, raw: &Option<String>) -> Result<Option<T>, FilterError> {
    blank(raw.as_deref())
        .map(|s| {
            s.parse().map_err(|_| FilterError::InvalidValue {
                field,
                value: s.to_owned(),
            })
        })
        .transpose()
}

/// Parse an optional float; `NaN` and infinities are rejected.
fn finite(field: &'static str, raw: &Option<String>) -> Result<Option<f64>, FilterError> {
    match parse::<f64>(field, raw)? {
        Some(v) if !v.is_finite() => Err(FilterError::InvalidValue {
            field,
            value: v.to_string(),
        }),
        other => Ok(other),
    }
}

fn date(field: &'static str, raw: &Option<String>) -> Result<Option<NaiveDate>, FilterError> {
    blank(raw.as_deref())
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| FilterError::InvalidValue {
                field,
                value: s.to_owned(),
            })
        })
        .transpose()
}

impl FilterParams {
    /// The reference date; it must leave room for the longest default window.
    pub fn as_of(&self, today: NaiveDate) -> Result<NaiveDate, FilterError> {
        let as_of = date("asOf", &self.as_of)?.unwrap_or(today);
        DateRange::trailing(as_of, LONGEST_WINDOW_DAYS)?;
        Ok(as_of)
    }

    /// The selected range, or the trailing `default_days` window.
    fn range(&self, today: NaiveDate, default_days: i64) -> Result<DateRange, FilterError> {
        let selected = DateRange::from_params(date("start", &self.start)?, date("end", &self.end)?)?;
        match selected {
            Some(range) => Ok(range),
            None => DateRange::trailing(self.as_of(today)?, default_days),
        }
    }

    pub fn sales(&self, today: NaiveDate) -> Result<SalesFilters, FilterError> {
        Ok(SalesFilters {
            range: self.range(today, SALES_WINDOW_DAYS)?,
            brand: Choice::from_param(self.brand.as_deref()),
            merchant: Choice::from_param(self.merchant.as_deref()),
        })
    }

    pub fn products(&self, today: NaiveDate) -> Result<ProductFilters, FilterError> {
        let mut filters = ProductFilters::new(self.as_of(today)?);
        filters.brand = Choice::from_param(self.brand.as_deref());
        filters.category = Choice::from_param(self.category.as_deref());
        filters.lookup = text(&self.lookup);
        filters.price_search = text(&self.price_search);
        filters.price_min = finite("priceMin", &self.price_min)?;
        filters.price_max = finite("priceMax", &self.price_max)?;
        filters.price_limit = parse("priceLimit", &self.price_limit)?.unwrap_or(DEFAULT_PRICE_LIMIT);
        filters.review_search = text(&self.review_search);
        filters.min_rating = finite("minRating", &self.min_rating)?.unwrap_or(0.0);
        filters.min_reviews = parse("minReviews", &self.min_reviews)?.unwrap_or(0);
        Ok(filters)
    }

    pub fn benchmarking(&self, today: NaiveDate) -> Result<BenchmarkFilters, FilterError> {
        let position =
            PricePosition::from_param(self.position.as_deref()).map_err(|_| FilterError::InvalidValue {
                field: "position",
                value: self.position.clone().unwrap_or_default(),
            })?;
        Ok(BenchmarkFilters {
            brand: Choice::from_param(self.brand.as_deref()),
            position,
            search: text(&self.search),
            competitor: Choice::from_param(self.competitor.as_deref()),
            stores: MultiSelect::from_param(self.stores.as_deref()),
            range: self.range(today, COMPETITOR_WINDOW_DAYS)?,
        })
    }

    pub fn customers(&self, today: NaiveDate) -> Result<CustomerFilters, FilterError> {
        let mut filters = CustomerFilters::new(self.range(today, CUSTOMER_WINDOW_DAYS)?, self.as_of(today)?);
        filters.min_spending = finite("minSpending", &self.min_spending)?.unwrap_or(0.0);
        filters.min_frequency = parse("minFrequency", &self.min_frequency)?.unwrap_or(0);
        filters.segments = MultiSelect::from_param(self.segments.as_deref())
            .values()
            .iter()
            .filter(|v| v.as_str() != ALL_SENTINEL)
            .map(|v| {
                v.parse::<CustomerSegment>().map_err(|_| FilterError::InvalidValue {
                    field: "segments",
                    value: v.clone(),
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(filters)
    }
}
