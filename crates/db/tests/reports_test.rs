//! Integration tests for the report builders against a small fixed warehouse.

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use retail_hub_core::filters::{Choice, DateRange, MultiSelect};
use retail_hub_core::reports::Section;
use retail_hub_core::segments::{CustomerSegment, PricePosition, PricingInsight, StockHealth};
use retail_hub_db::reports::{
    benchmark_report, customer_report, product_report, sales_report, BenchmarkFilters,
    CustomerFilters, ProductFilters, SalesFilters,
};
use retail_hub_db::Database;

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

async fn exec(db: &Database, sql: &str) {
    sqlx::query(sql).execute(db.pool()).await.unwrap();
}

/// Three products, two merchants, six sales across two periods, and
/// competitor prices for each product.
async fn warehouse() -> Database {
    let db = Database::new_in_memory().await.unwrap();
    exec(
        &db,
        "INSERT INTO Products (ITEM_ID, PRODUCT_TITLE, BRAND, TAXONOMY, SKU) VALUES \
         ('A1', 'Alpha Lamp', 'Acme', 'Home > Lighting', 'S-A1'), \
         ('B1', 'Beta Phone', 'Bolt', 'Electronics > Phones', 'S-B1'), \
         ('C1', 'Gamma Mug', 'Acme', 'Home > Kitchen', 'S-C1')",
    )
    .await;
    exec(
        &db,
        "INSERT INTO Third_Party_Merchants VALUES (1, 'North'), (2, 'South')",
    )
    .await;
    exec(
        &db,
        "INSERT INTO Sales (SALE_ID, ITEM_ID, MERCHANT_ID, CUSTOMER_ID, SALE_DATE, QUANTITY_SOLD, \
         SALE_PRICE, TOTAL_SALE_AMOUNT, DISCOUNT_APPLIED, PAYMENT_METHOD) VALUES \
         (1, 'A1', 1, 1, '2024-03-25', 2, 10, 20, 0, 'Card'), \
         (2, 'B1', 2, 2, '2024-03-26', 1, 100, 100, 10, 'Cash'), \
         (3, 'C1', 1, 1, '2024-03-26', 1, 5, 5, 0, 'Card'), \
         (4, 'A1', 2, 3, '2024-03-31', 1, 10, 10, 0, 'Card'), \
         (5, 'B1', 1, 2, '2024-03-15', 1, 90, 90, 0, 'Cash'), \
         (6, 'A1', 1, 4, '2024-03-20', 1, 10, 10, 0, 'Card')",
    )
    .await;
    exec(
        &db,
        "INSERT INTO Reviews VALUES ('A1', 4.0, 10), ('A1', 5.0, 30), ('B1', 2.5, 100)",
    )
    .await;
    exec(
        &db,
        "INSERT INTO Availability VALUES ('A1', 'IN_STOCK'), ('B1', 'LIMITED_STOCK'), ('C1', 'OUT_OF_STOCK')",
    )
    .await;
    exec(
        &db,
        "INSERT INTO Benchmark VALUES \
         (1, 'CompA', 'StoreX', 'Home', 'Lighting', 'Lamp X'), \
         (2, 'CompB', 'StoreY', 'Electronics', 'Phones', 'Phone Y'), \
         (3, 'CompA', 'StoreY', 'Home', 'Kitchen', 'Mug Y')",
    )
    .await;
    exec(
        &db,
        "INSERT INTO Pricing VALUES \
         ('A1', 10, 1, 11, 8, '2024-03-20'), \
         ('A1', 10, 1, 11, 9, '2024-03-27'), \
         ('B1', 100, 2, 105, 110, '2024-03-20'), \
         ('C1', 5, 3, 6, 5, '2024-03-20')",
    )
    .await;
    db
}

fn sales_filters() -> SalesFilters {
    SalesFilters {
        range: DateRange::new(d("2024-03-22"), d("2024-03-31")).unwrap(),
        brand: Choice::All,
        merchant: Choice::All,
    }
}

#[tokio::test]
async fn test_sales_kpis_compare_previous_period() {
    let db = warehouse().await;
    let report = sales_report(&db, &sales_filters()).await;

    assert_eq!(report.period.previous_start, "2024-03-12");
    assert_eq!(report.period.previous_end, "2024-03-21");

    let kpis = report.kpis.data().unwrap();
    assert_eq!(kpis.revenue.current, 135.0);
    assert_eq!(kpis.revenue.previous, 100.0);
    assert_eq!(kpis.revenue.growth_pct, Some(35.0));
    assert_eq!(kpis.orders.delta, 2.0);
    assert_eq!(kpis.customers.growth_pct, Some(50.0));
    assert_eq!(kpis.units.current, 5.0);
    assert_eq!(kpis.aov.current, 33.75);
    assert_eq!(kpis.discount_rate, Some(7.41));
    assert_eq!(kpis.conversion_rate, Some(133.33));
}

#[tokio::test]
async fn test_sales_brand_filter_and_zero_previous() {
    let db = warehouse().await;
    let mut filters = sales_filters();
    filters.brand = Choice::Value("Bolt".into());
    filters.range = DateRange::new(d("2024-03-25"), d("2024-03-31")).unwrap();

    let report = sales_report(&db, &filters).await;
    let kpis = report.kpis.data().unwrap();
    assert_eq!(kpis.revenue.current, 100.0);
    // previous window 2024-03-18..=2024-03-24 has no Bolt sales
    assert_eq!(kpis.revenue.previous, 0.0);
    assert_eq!(kpis.revenue.growth_pct, None);

    // brand chart ignores the brand selector
    let brands = report.top_brands.data().unwrap();
    assert_eq!(brands.len(), 2);
    // merchant breakdown honours it
    let merchants = report.merchants.data().unwrap();
    assert_eq!(merchants.top_merchant.as_deref(), Some("South"));
    assert_eq!(merchants.merchants.len(), 1);
}

#[tokio::test]
async fn test_sales_trend_weekdays_and_rankings() {
    let db = warehouse().await;
    let report = sales_report(&db, &sales_filters()).await;

    let trend = report.daily_trend.data().unwrap();
    let dates: Vec<&str> = trend.iter().map(|p| p.date.as_str()).collect();
    assert_eq!(dates, vec!["2024-03-25", "2024-03-26", "2024-03-31"]);
    assert_eq!(trend[1].revenue_ma7, 62.5);
    assert_eq!(trend[2].revenue_ma7, 45.0);

    let weekdays = report.weekdays.data().unwrap();
    assert_eq!(weekdays[0].revenue, 20.0); // Monday
    assert_eq!(weekdays[1].revenue, 105.0); // Tuesday
    assert_eq!(weekdays[6].revenue, 10.0); // Sunday
    assert_eq!(weekdays[3].orders, 0);

    let categories = report.top_categories.data().unwrap();
    assert_eq!(categories[0].category, "Electronics");
    assert_eq!(categories[1].category, "Home");
    assert_eq!(categories[1].orders, 3);

    // two review rows for A1 must not double its revenue
    let products = report.top_products.data().unwrap();
    let alpha = products.iter().find(|p| p.item_id == "A1").unwrap();
    assert_eq!(alpha.revenue, 30.0);
    assert_eq!(alpha.avg_rating, 4.5);
    assert_eq!(products[0].item_id, "B1");
}

#[tokio::test]
async fn test_sales_empty_range_degrades_to_empty_sections() {
    let db = warehouse().await;
    let mut filters = sales_filters();
    filters.range = DateRange::new(d("2023-01-01"), d("2023-01-31")).unwrap();
    let report = sales_report(&db, &filters).await;

    assert!(matches!(report.kpis, Section::Empty { .. }));
    assert!(matches!(report.daily_trend, Section::Empty { .. }));
    assert!(matches!(report.merchants, Section::Empty { .. }));
}

#[tokio::test]
async fn test_product_inventory_and_lookup() {
    let db = warehouse().await;
    let mut filters = ProductFilters::new(d("2024-03-31"));
    filters.lookup = Some("lamp".into());
    let report = product_report(&db, &filters).await;

    let inventory = report.inventory.data().unwrap();
    assert_eq!(inventory.total_products, 3);
    assert_eq!(
        (inventory.in_stock, inventory.limited_stock, inventory.out_of_stock),
        (1, 1, 1)
    );
    assert_eq!(inventory.stock_rate, Some(33.3));
    assert_eq!(inventory.health, StockHealth::NeedsAttention);
    assert_eq!(inventory.avg_price, Some(31.25));
    assert_eq!(inventory.avg_daily_units, 1.4);
    assert_eq!(inventory.revenue_30d, 235.0);

    let hits = report.stock_lookup.data().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].sku.as_deref(), Some("S-A1"));
    assert_eq!(hits[0].availability.as_deref(), Some("IN_STOCK"));
    assert_eq!(hits[0].price, Some(10.0));

    let sellers = report.top_sellers.data().unwrap();
    assert_eq!(sellers[0].item_id, "A1");
    assert_eq!(sellers[0].units, 4);
}

#[tokio::test]
async fn test_product_category_filter_uses_taxonomy_root() {
    let db = warehouse().await;
    let mut filters = ProductFilters::new(d("2024-03-31"));
    filters.category = Choice::Value("Home".into());
    let report = product_report(&db, &filters).await;

    assert_eq!(report.inventory.data().unwrap().total_products, 2);
    assert!(matches!(report.stock_lookup, Section::Empty { .. }));

    let matrix = report.profitability.data().unwrap();
    assert_eq!(matrix.products.len(), 2);
    let reviews = report.reviews.data().unwrap();
    assert_eq!(reviews.summary.products, 1);
    assert_eq!(reviews.summary.total_reviews, 40);
}

fn benchmark_filters() -> BenchmarkFilters {
    BenchmarkFilters {
        brand: Choice::All,
        position: None,
        search: None,
        competitor: Choice::All,
        stores: MultiSelect::default(),
        range: DateRange::new(d("2024-03-01"), d("2024-03-31")).unwrap(),
    }
}

#[tokio::test]
async fn test_benchmark_comparison_counts_and_insight() {
    let db = warehouse().await;
    let report = benchmark_report(&db, &benchmark_filters()).await;

    let comparison = report.comparison.data().unwrap();
    assert_eq!((comparison.above, comparison.below, comparison.at), (2, 1, 1));
    assert_eq!(comparison.rows[0].difference_pct, Some(25.0));
    assert_eq!(comparison.rows[3].position, PricePosition::Below);
    assert_eq!(comparison.avg_difference_pct, Some(6.76));
    assert_eq!(comparison.insight, Some(PricingInsight::Overpriced));
    assert_eq!(comparison.parity_max, 110.0);

    let mut below = benchmark_filters();
    below.position = Some(PricePosition::Below);
    let report = benchmark_report(&db, &below).await;
    let comparison = report.comparison.data().unwrap();
    assert_eq!(comparison.rows.len(), 1);
    assert_eq!(comparison.insight, Some(PricingInsight::Competitive));
}

#[tokio::test]
async fn test_benchmark_competitor_defaults_to_first_brand() {
    let db = warehouse().await;
    let report = benchmark_report(&db, &benchmark_filters()).await;

    let analysis = report.competitor.data().unwrap();
    assert_eq!(analysis.competitor, "CompA");
    assert_eq!(analysis.trend.len(), 3);
    assert_eq!(analysis.kpis.min_price, 5.0);
    assert_eq!(analysis.kpis.max_price, 9.0);
    assert_eq!(analysis.kpis.products_tracked, 2);
    assert_eq!(analysis.kpis.volatility, Some(2.08));

    let mut one_store = benchmark_filters();
    one_store.stores = MultiSelect::from_param(Some("StoreY"));
    let report = benchmark_report(&db, &one_store).await;
    let analysis = report.competitor.data().unwrap();
    assert_eq!(analysis.trend.len(), 1);
    assert_eq!(analysis.kpis.volatility, None);

    let hierarchy = report.hierarchy.data().unwrap();
    let names: Vec<(&str, &str)> = hierarchy
        .iter()
        .map(|n| (n.category.as_str(), n.subcategory.as_str()))
        .collect();
    assert_eq!(
        names,
        vec![("Electronics", "Phones"), ("Home", "Kitchen"), ("Home", "Lighting")]
    );
}

#[tokio::test]
async fn test_customer_segments_on_warehouse_rows() {
    let db = Database::new_in_memory().await.unwrap();
    exec(
        &db,
        "INSERT INTO Sales (SALE_ID, ITEM_ID, MERCHANT_ID, CUSTOMER_ID, SALE_DATE, QUANTITY_SOLD, \
         SALE_PRICE, TOTAL_SALE_AMOUNT, DISCOUNT_APPLIED, PAYMENT_METHOD) VALUES \
         (1, 'x', 1, 10, '2024-03-01', 1, 10, 10, 0, 'Card'), \
         (2, 'x', 1, 10, '2024-03-02', 1, 10, 10, 0, 'Card'), \
         (3, 'x', 1, 10, '2024-03-03', 1, 10, 10, 0, 'Card'), \
         (4, 'x', 1, 10, '2024-03-30', 1, 10, 10, 0, 'Cash'), \
         (5, 'x', 1, 20, '2024-03-10', 1, 40, 40, 0, 'Card'), \
         (6, 'x', 1, 30, '2024-03-04', 1, 2.5, 2.5, 0, 'Card'), \
         (7, 'x', 1, 30, '2024-03-05', 1, 2.5, 2.5, 0, 'Card'), \
         (8, 'x', 1, 30, '2024-03-06', 1, 2.5, 2.5, 0, 'Card'), \
         (9, 'x', 1, 30, '2024-03-07', 1, 2.5, 2.5, 0, 'Cash'), \
         (10, 'x', 1, 40, '2024-03-08', 1, 10, 10, 0, 'Card')",
    )
    .await;

    let range = DateRange::new(d("2024-03-01"), d("2024-03-31")).unwrap();
    let report = customer_report(&db, &CustomerFilters::new(range, d("2024-03-31"))).await;

    let payments = report.payments.data().unwrap();
    assert_eq!(payments.top_method.as_deref(), Some("Card"));
    assert_eq!(payments.top_share_pct, Some(80.0));

    let seg = report.segmentation.data().unwrap();
    assert_eq!(seg.thresholds.frequency_median, 2.5);
    assert_eq!(seg.thresholds.spend_median, 25.0);
    let segment_of = |id: i64| {
        seg.top_customers
            .iter()
            .find(|c| c.customer_id == id)
            .map(|c| c.segment)
    };
    assert_eq!(segment_of(10), Some(CustomerSegment::Vip));
    assert_eq!(segment_of(20), Some(CustomerSegment::HighSpender));
    assert_eq!(segment_of(30), Some(CustomerSegment::Frequent));
    assert_eq!(segment_of(40), Some(CustomerSegment::Occasional));

    let vip = seg.top_customers.iter().find(|c| c.customer_id == 10).unwrap();
    assert_eq!(vip.days_since_last_purchase, 1);
    assert_eq!(vip.last_purchase, "2024-03-30");
}

#[tokio::test]
async fn test_demo_warehouse_renders_every_section() {
    let db = Database::new_in_memory().await.unwrap();
    let as_of = d("2024-06-30");
    retail_hub_db::demo::seed_demo(&db, as_of).await.unwrap();

    let sales = sales_report(
        &db,
        &SalesFilters {
            range: DateRange::trailing(as_of, 90).unwrap(),
            brand: Choice::All,
            merchant: Choice::All,
        },
    )
    .await;
    assert!(sales.kpis.data().is_some());
    assert!(sales.top_products.data().is_some());

    let products = product_report(&db, &ProductFilters::new(as_of)).await;
    assert!(products.pricing.data().is_some());
    assert!(products.reviews.data().is_some());

    let mut bench = benchmark_filters();
    bench.range = DateRange::trailing(as_of, 90).unwrap();
    let benchmark = benchmark_report(&db, &bench).await;
    assert!(benchmark.comparison.data().is_some());
    assert_eq!(benchmark.competitor.data().unwrap().competitor, "BargainBarn");

    let customers = customer_report(
        &db,
        &CustomerFilters::new(DateRange::trailing(as_of, 180).unwrap(), as_of),
    )
    .await;
    let seg = customers.segmentation.data().unwrap();
    assert_eq!(seg.segments.len(), 4);
}
