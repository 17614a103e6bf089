// crates/core/src/filters.rs
//! Filter resolution: UI selections → typed, parameter-bound predicates.
//!
//! Every selector resolves to `Option<Predicate>`. `None` means "no filter",
//! and callers simply skip it, so an "All" selection yields exactly the SQL
//! of a query built without that filter.

use chrono::{Duration, NaiveDate};
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Sentinel the UI uses for "no constraint" in single and multi selects.
pub const ALL_SENTINEL: &str = "All";

/// First `" > "` segment of a product taxonomy path, e.g.
/// `"Electronics > Audio"` → `"Electronics"`.
pub const CATEGORY_EXPR: &str = "CASE WHEN instr(p.TAXONOMY, ' > ') > 0 \
     THEN substr(p.TAXONOMY, 1, instr(p.TAXONOMY, ' > ') - 1) \
     ELSE p.TAXONOMY END";

#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("Please select both start and end dates")]
    IncompleteDateRange,

    #[error("Start date {start} must not be after end date {end}")]
    InvertedDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

// ============================================================================
// Columns and bind values
// ============================================================================

/// Closed set of filterable columns. Identifiers never come from user input.
///
/// Expressions assume the aliases used by the report queries:
/// `s` Sales, `p` Products, `m` Third_Party_Merchants, `pr` Pricing,
/// `b` Benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    SaleDate,
    Brand,
    MerchantName,
    ProductCategory,
    ProductTitle,
    BenchmarkCategory,
    CompetitorBrand,
    CompetitorStore,
    ScrapeDate,
}

impl Column {
    pub fn sql(self) -> &'static str {
        match self {
            Column::SaleDate => "s.SALE_DATE",
            Column::Brand => "p.BRAND",
            Column::MerchantName => "m.THIRD_PARTY_MERCHANT_NAME",
            Column::ProductCategory => CATEGORY_EXPR,
            Column::ProductTitle => "p.PRODUCT_TITLE",
            Column::BenchmarkCategory => "b.BENCHMARK_CATG",
            Column::CompetitorBrand => "b.BENCHMARK_BRAND_NAME",
            Column::CompetitorStore => "b.BENCHMARK_STORE",
            Column::ScrapeDate => "pr.PRICE_SCRAPE_DATE",
        }
    }
}

/// A value bound to a `?` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Text(String),
    Int(i64),
    Float(f64),
}

impl BindValue {
    pub fn date(date: NaiveDate) -> Self {
        BindValue::Text(date.format("%Y-%m-%d").to_string())
    }
}

// Floats hash by bit pattern so bound queries can key the cache.
impl Eq for BindValue {}

impl Hash for BindValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            BindValue::Text(s) => s.hash(state),
            BindValue::Int(i) => i.hash(state),
            BindValue::Float(f) => f.to_bits().hash(state),
        }
    }
}

impl From<&str> for BindValue {
    fn from(s: &str) -> Self {
        BindValue::Text(s.to_owned())
    }
}

impl From<String> for BindValue {
    fn from(s: String) -> Self {
        BindValue::Text(s)
    }
}

impl From<i64> for BindValue {
    fn from(i: i64) -> Self {
        BindValue::Int(i)
    }
}

impl From<f64> for BindValue {
    fn from(f: f64) -> Self {
        BindValue::Float(f)
    }
}

impl From<NaiveDate> for BindValue {
    fn from(d: NaiveDate) -> Self {
        BindValue::date(d)
    }
}

// ============================================================================
// Predicates
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq {
        column: Column,
        value: BindValue,
    },
    Between {
        column: Column,
        start: BindValue,
        end: BindValue,
    },
    In {
        column: Column,
        values: Vec<BindValue>,
    },
    /// Case-insensitive substring match; the pattern is already escaped.
    Contains { column: Column, pattern: String },
}

impl Predicate {
    /// Append ` AND <predicate>` to `sql`, pushing bind values in placeholder order.
    pub fn render(&self, sql: &mut String, binds: &mut Vec<BindValue>) {
        match self {
            Predicate::Eq { column, value } => {
                sql.push_str(" AND ");
                sql.push_str(column.sql());
                sql.push_str(" = ?");
                binds.push(value.clone());
            }
            Predicate::Between { column, start, end } => {
                sql.push_str(" AND ");
                sql.push_str(column.sql());
                sql.push_str(" BETWEEN ? AND ?");
                binds.push(start.clone());
                binds.push(end.clone());
            }
            Predicate::In { column, values } => {
                sql.push_str(" AND ");
                sql.push_str(column.sql());
                sql.push_str(" IN (");
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(", ");
                    }
                    sql.push('?');
                    binds.push(value.clone());
                }
                sql.push(')');
            }
            Predicate::Contains { column, pattern } => {
                sql.push_str(" AND lower(");
                sql.push_str(column.sql());
                sql.push_str(") LIKE ? ESCAPE '\\'");
                binds.push(BindValue::Text(pattern.clone()));
            }
        }
    }
}

/// Ordered collection of resolved predicates for one query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    predicates: Vec<Predicate>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resolved selection; `None` leaves the set unchanged.
    pub fn with(mut self, predicate: Option<Predicate>) -> Self {
        if let Some(p) = predicate {
            self.predicates.push(p);
        }
        self
    }

    pub fn push(&mut self, predicate: Option<Predicate>) {
        if let Some(p) = predicate {
            self.predicates.push(p);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn render(&self, sql: &mut String, binds: &mut Vec<BindValue>) {
        for p in &self.predicates {
            p.render(sql, binds);
        }
    }
}

// ============================================================================
// Selections
// ============================================================================

/// A single-choice selector (brand, merchant, category, competitor).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Choice {
    #[default]
    All,
    Value(String),
}

impl Choice {
    /// Parse from an optional query parameter.
    /// None, blank, and "All" → All; anything else → Value.
    pub fn from_param(param: Option<&str>) -> Self {
        match param.map(str::trim) {
            None | Some("") => Choice::All,
            Some(s) if s == ALL_SENTINEL => Choice::All,
            Some(s) => Choice::Value(s.to_owned()),
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            Choice::All => None,
            Choice::Value(v) => Some(v),
        }
    }

    pub fn resolve(&self, column: Column) -> Option<Predicate> {
        self.value().map(|v| Predicate::Eq {
            column,
            value: BindValue::from(v),
        })
    }
}

fn days_before(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    date.checked_sub_signed(Duration::try_days(days)?)
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Rejects ranges whose previous window would fall before the first
    /// representable date.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, FilterError> {
        if start > end {
            return Err(FilterError::InvertedDateRange { start, end });
        }
        let range = Self { start, end };
        range.checked_previous().ok_or_else(|| FilterError::InvalidValue {
            field: "start",
            value: start.to_string(),
        })?;
        Ok(range)
    }

    /// Parse optional bounds. Neither bound → `Ok(None)` (no constraint);
    /// exactly one bound is an incomplete selection.
    pub fn from_params(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Option<Self>, FilterError> {
        match (start, end) {
            (None, None) => Ok(None),
            (Some(start), Some(end)) => Self::new(start, end).map(Some),
            _ => Err(FilterError::IncompleteDateRange),
        }
    }

    /// The `days`-long window ending on `as_of`: `[as_of - days, as_of]`.
    pub fn trailing(as_of: NaiveDate, days: i64) -> Result<Self, FilterError> {
        let out_of_range = || FilterError::InvalidValue {
            field: "asOf",
            value: as_of.to_string(),
        };
        let start = days_before(as_of, days).ok_or_else(out_of_range)?;
        let range = Self { start, end: as_of };
        range.checked_previous().ok_or_else(out_of_range)?;
        Ok(range)
    }

    /// Number of days between the bounds (0 for a single-day range).
    pub fn period_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// The equally long window ending the day before `start`.
    ///
    /// Ranges from [`DateRange::new`] and [`DateRange::trailing`] always have
    /// one; a hand-built range at the calendar's lower edge clamps to
    /// `NaiveDate::MIN`.
    pub fn previous(&self) -> Self {
        self.checked_previous().unwrap_or(Self {
            start: NaiveDate::MIN,
            end: NaiveDate::MIN,
        })
    }

    fn checked_previous(&self) -> Option<Self> {
        let end = days_before(self.start, 1)?;
        Some(Self {
            start: days_before(end, self.period_days())?,
            end,
        })
    }

    pub fn resolve(&self, column: Column) -> Predicate {
        Predicate::Between {
            column,
            start: BindValue::date(self.start),
            end: BindValue::date(self.end),
        }
    }
}

/// A multi-select (e.g. competitor stores).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct MultiSelect(Vec<String>);

impl MultiSelect {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for v in values {
            let v = v.as_ref().trim();
            if !v.is_empty() && !out.iter().any(|o| o == v) {
                out.push(v.to_owned());
            }
        }
        Self(out)
    }

    /// Parse a comma-separated query parameter.
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some(p) => Self::new(p.split(',')),
            None => Self::default(),
        }
    }

    pub fn values(&self) -> &[String] {
        &self.0
    }

    /// Empty, or containing "All".
    pub fn is_unconstrained(&self) -> bool {
        self.0.is_empty() || self.0.iter().any(|v| v == ALL_SENTINEL)
    }

    pub fn resolve(&self, column: Column) -> Option<Predicate> {
        if self.is_unconstrained() {
            return None;
        }
        Some(Predicate::In {
            column,
            values: self.0.iter().map(|v| BindValue::from(v.as_str())).collect(),
        })
    }
}

/// Free-text search → case-insensitive substring predicate.
pub fn resolve_search(column: Column, text: Option<&str>) -> Option<Predicate> {
    let text = text.map(str::trim).filter(|t| !t.is_empty())?;
    Some(Predicate::Contains {
        column,
        pattern: format!("%{}%", escape_like(&text.to_lowercase())),
    })
}

/// Escape LIKE wildcards for use with `ESCAPE '\'`.
pub fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
