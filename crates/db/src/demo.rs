// crates/db/src/demo.rs
//! Deterministic sample warehouse for local runs and integration tests.
//!
//! The same `as_of` date always yields the same rows.

use chrono::{Duration, NaiveDate};
use sqlx::{Sqlite, Transaction};
use tracing::info;

use crate::{Database, DbResult};

pub const DEMO_DAYS: i64 = 200;
pub const DEMO_CUSTOMERS: i64 = 40;

const PRODUCTS: &[(&str, &str, &str, &str, f64)] = &[
    ("P001", "Wireless Earbuds", "Acme", "Electronics > Audio", 59.99),
    ("P002", "Bluetooth Speaker", "Acme", "Electronics > Audio", 89.00),
    ("P003", "4K Monitor", "Globex", "Electronics > Displays", 329.00),
    ("P004", "USB-C Cable", "Globex", "Electronics > Accessories", 12.50),
    ("P005", "Chef's Knife", "Northwind", "Home & Kitchen > Cutlery", 74.95),
    ("P006", "Espresso Maker", "Northwind", "Home & Kitchen > Appliances", 189.00),
    ("P007", "Cast Iron Pan", "Northwind", "Home & Kitchen > Cookware", 42.00),
    ("P008", "Yoga Mat", "Initech", "Sports > Fitness", 29.99),
    ("P009", "Trail Running Shoes", "Initech", "Sports > Footwear", 119.00),
    ("P010", "Adjustable Dumbbells", "Initech", "Sports > Fitness", 249.00),
    ("P011", "Building Blocks Set", "Acme", "Toys > Construction", 49.99),
    ("P012", "Puzzle 1000pc", "Globex", "Toys", 18.00),
];

const MERCHANTS: &[(i64, &str)] = &[(1, "ShopRight"), (2, "MarketHub"), (3, "QuickCart")];

const COMPETITORS: &[&str] = &["BargainBarn", "PriceCo", "ValueMax"];
const STORES: &[&str] = &["CityStore", "MegaMart", "WebShop"];
const PAYMENT_METHODS: &[&str] = &["Credit Card", "PayPal", "Debit Card", "Gift Card"];

/// Row counts written by [`seed_demo`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DemoSummary {
    pub products: u64,
    pub sales: u64,
    pub pricing: u64,
}

/// Small linear congruential generator; fixed seed, no external state.
struct Lcg(u64);

impl Lcg {
    fn step(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn below(&mut self, n: u64) -> u64 {
        self.step() % n.max(1)
    }

    /// Uniform-ish value in `[lo, hi)`.
    fn between(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * (self.below(10_000) as f64 / 10_000.0)
    }
}

fn cents(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Replace the warehouse contents with the sample data set.
pub async fn seed_demo(db: &Database, as_of: NaiveDate) -> DbResult<DemoSummary> {
    let mut rng = Lcg(as_of.format("%Y%m%d").to_string().parse().unwrap_or(1));
    let mut tx = db.pool().begin().await?;

    for table in [
        "Sales",
        "Reviews",
        "Availability",
        "Pricing",
        "Benchmark",
        "Third_Party_Merchants",
        "Products",
    ] {
        sqlx::query(&format!("DELETE FROM {table}"))
            .execute(&mut *tx)
            .await?;
    }

    let mut summary = DemoSummary::default();
    insert_catalogue(&mut tx, &mut rng, &mut summary).await?;
    insert_pricing(&mut tx, &mut rng, as_of, &mut summary).await?;
    insert_sales(&mut tx, &mut rng, as_of, &mut summary).await?;
    tx.commit().await?;

    db.cache().invalidate_all();
    info!(
        products = summary.products,
        sales = summary.sales,
        pricing = summary.pricing,
        %as_of,
        "Seeded demo warehouse"
    );
    Ok(summary)
}

async fn insert_catalogue(
    tx: &mut Transaction<'_, Sqlite>,
    rng: &mut Lcg,
    summary: &mut DemoSummary,
) -> DbResult<()> {
    for &(id, name) in MERCHANTS {
        sqlx::query("INSERT INTO Third_Party_Merchants (MERCHANT_ID, THIRD_PARTY_MERCHANT_NAME) VALUES (?, ?)")
            .bind(id)
            .bind(name)
            .execute(&mut **tx)
            .await?;
    }

    for (i, &(id, title, brand, taxonomy, _)) in PRODUCTS.iter().enumerate() {
        sqlx::query("INSERT INTO Products (ITEM_ID, PRODUCT_TITLE, BRAND, TAXONOMY, SKU) VALUES (?, ?, ?, ?, ?)")
            .bind(id)
            .bind(title)
            .bind(brand)
            .bind(taxonomy)
            .bind(format!("SKU-{:04}", i + 1))
            .execute(&mut **tx)
            .await?;

        let availability = match i % 5 {
            3 => "LIMITED_STOCK",
            4 => "OUT_OF_STOCK",
            _ => "IN_STOCK",
        };
        sqlx::query("INSERT INTO Availability (ITEM_ID, AVAILABILITY_INDICATOR) VALUES (?, ?)")
            .bind(id)
            .bind(availability)
            .execute(&mut **tx)
            .await?;

        for _ in 0..=rng.below(2) {
            sqlx::query("INSERT INTO Reviews (ITEM_ID, ITEM_REVIEW_RATING, ITEM_REVIEW_COUNT) VALUES (?, ?, ?)")
                .bind(id)
                .bind((rng.between(2.0, 5.0) * 10.0).round() / 10.0)
                .bind(rng.below(400) as i64 + 5)
                .execute(&mut **tx)
                .await?;
        }

        let category = taxonomy.split(" > ").next().unwrap_or(taxonomy);
        let subcategory = taxonomy.split(" > ").nth(1).unwrap_or("General");
        sqlx::query(
            "INSERT INTO Benchmark (BENCHMARK_ID, BENCHMARK_BRAND_NAME, BENCHMARK_STORE, \
             BENCHMARK_CATG, BENCHMARK_SUBCATG, BENCHMARK_ITEM_SUB_DESC) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(i as i64 + 1)
        .bind(COMPETITORS[i % COMPETITORS.len()])
        .bind(STORES[(i / COMPETITORS.len()) % STORES.len()])
        .bind(category)
        .bind(subcategory)
        .bind(format!("{title} (competitor)"))
        .execute(&mut **tx)
        .await?;

        summary.products += 1;
    }
    Ok(())
}

async fn insert_pricing(
    tx: &mut Transaction<'_, Sqlite>,
    rng: &mut Lcg,
    as_of: NaiveDate,
    summary: &mut DemoSummary,
) -> DbResult<()> {
    for (i, &(id, _, _, _, price)) in PRODUCTS.iter().enumerate() {
        // Weekly scrapes over the last twelve weeks.
        for week in 0..12 {
            let scraped = as_of - Duration::days(week * 7);
            let site_price = cents(price * rng.between(0.88, 1.12));
            sqlx::query(
                "INSERT INTO Pricing (ITEM_ID, PRODUCT_PRICE, BENCHMARK_ID, BENCHMARK_BASE_PRICE, \
                 BENCHMARK_SITE_PRICE, PRICE_SCRAPE_DATE) VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(id)
            .bind(price)
            .bind(i as i64 + 1)
            .bind(cents(price * 1.05))
            .bind(site_price)
            .bind(scraped.format("%Y-%m-%d").to_string())
            .execute(&mut **tx)
            .await?;
            summary.pricing += 1;
        }
    }
    Ok(())
}

async fn insert_sales(
    tx: &mut Transaction<'_, Sqlite>,
    rng: &mut Lcg,
    as_of: NaiveDate,
    summary: &mut DemoSummary,
) -> DbResult<()> {
    let mut sale_id = 0i64;
    for day in 0..DEMO_DAYS {
        let date = (as_of - Duration::days(day)).format("%Y-%m-%d").to_string();
        for _ in 0..(2 + rng.below(4)) {
            sale_id += 1;
            let (item, _, _, _, list_price) = PRODUCTS[rng.below(PRODUCTS.len() as u64) as usize];
            let quantity = 1 + rng.below(3) as i64;
            let unit_price = cents(list_price * rng.between(0.95, 1.05));
            let gross = unit_price * quantity as f64;
            let discount = if rng.below(4) == 0 { cents(gross * 0.05) } else { 0.0 };

            sqlx::query(
                "INSERT INTO Sales (SALE_ID, ITEM_ID, MERCHANT_ID, CUSTOMER_ID, SALE_DATE, \
                 QUANTITY_SOLD, SALE_PRICE, TOTAL_SALE_AMOUNT, DISCOUNT_APPLIED, PAYMENT_METHOD) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(sale_id)
            .bind(item)
            .bind(MERCHANTS[rng.below(MERCHANTS.len() as u64) as usize].0)
            .bind(1 + rng.below(DEMO_CUSTOMERS as u64) as i64)
            .bind(&date)
            .bind(quantity)
            .bind(unit_price)
            .bind(cents(gross - discount))
            .bind(discount)
            .bind(PAYMENT_METHODS[rng.below(PAYMENT_METHODS.len() as u64) as usize])
            .execute(&mut **tx)
            .await?;
            summary.sales += 1;
        }
    }
    Ok(())
}
