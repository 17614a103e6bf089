// crates/db/src/options.rs
//! Distinct values feeding the dashboard's selectors.

use std::str::FromStr;
use std::sync::Arc;

use crate::query::BoundQuery;
use crate::{Database, DbResult};

/// Closed set of option lists; each maps to one fixed `SELECT DISTINCT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionSource {
    Brands,
    Merchants,
    Categories,
    CompetitorBrands,
    Stores,
    PaymentMethods,
}

impl OptionSource {
    pub const ALL: [OptionSource; 6] = [
        OptionSource::Brands,
        OptionSource::Merchants,
        OptionSource::Categories,
        OptionSource::CompetitorBrands,
        OptionSource::Stores,
        OptionSource::PaymentMethods,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            OptionSource::Brands => "brands",
            OptionSource::Merchants => "merchants",
            OptionSource::Categories => "categories",
            OptionSource::CompetitorBrands => "competitors",
            OptionSource::Stores => "stores",
            OptionSource::PaymentMethods => "payment-methods",
        }
    }

    fn table_column(self) -> (&'static str, &'static str) {
        match self {
            OptionSource::Brands => ("Products", "BRAND"),
            OptionSource::Merchants => ("Third_Party_Merchants", "THIRD_PARTY_MERCHANT_NAME"),
            OptionSource::Categories => ("Benchmark", "BENCHMARK_CATG"),
            OptionSource::CompetitorBrands => ("Benchmark", "BENCHMARK_BRAND_NAME"),
            OptionSource::Stores => ("Benchmark", "BENCHMARK_STORE"),
            OptionSource::PaymentMethods => ("Sales", "PAYMENT_METHOD"),
        }
    }

    fn query(self) -> BoundQuery {
        let (table, column) = self.table_column();
        BoundQuery::new(format!(
            "SELECT DISTINCT {column} FROM {table} \
             WHERE {column} IS NOT NULL AND trim({column}) <> '' ORDER BY {column}"
        ))
    }
}

impl FromStr for OptionSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OptionSource::ALL
            .into_iter()
            .find(|o| o.slug() == s)
            .ok_or_else(|| format!("unknown option list: {s}"))
    }
}

/// Sorted distinct values for `source` (cached).
pub async fn filter_options(db: &Database, source: OptionSource) -> DbResult<Vec<String>> {
    let rows: Arc<Vec<(String,)>> = source.query().fetch_cached(db).await?;
    Ok(rows.iter().map(|(v,)| v.clone()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_brand_options_are_distinct_and_sorted() {
        let db = Database::new_in_memory().await.unwrap();
        sqlx::query(
            "INSERT INTO Products (ITEM_ID, PRODUCT_TITLE, BRAND) VALUES \
             ('1', 'a', 'Zeta'), ('2', 'b', 'Acme'), ('3', 'c', 'Acme'), ('4', 'd', NULL), ('5', 'e', ' ')",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let brands = filter_options(&db, OptionSource::Brands).await.unwrap();
        assert_eq!(brands, vec!["Acme".to_string(), "Zeta".to_string()]);
    }

    #[test]
    fn test_slugs_parse() {
        for source in OptionSource::ALL {
            assert_eq!(source.slug().parse::<OptionSource>(), Ok(source));
        }
        assert!("Products".parse::<OptionSource>().is_err());
    }
}
