/// Inline SQL migrations for the retail warehouse schema.
///
/// The dashboard only reads these tables; the statements let a fresh file
/// (or an in-memory test database) carry the same shape as production.
/// Dates are ISO `YYYY-MM-DD` text.

pub const MIGRATIONS: &[&str] = &[
    // Migration 1: product catalogue
    r#"
CREATE TABLE IF NOT EXISTS Products (
    ITEM_ID TEXT PRIMARY KEY,
    PRODUCT_TITLE TEXT NOT NULL,
    BRAND TEXT,
    TAXONOMY TEXT,
    SKU TEXT
);
"#,
    // Migration 2: competitor benchmark catalogue
    r#"
CREATE TABLE IF NOT EXISTS Benchmark (
    BENCHMARK_ID INTEGER PRIMARY KEY,
    BENCHMARK_BRAND_NAME TEXT,
    BENCHMARK_STORE TEXT,
    BENCHMARK_CATG TEXT,
    BENCHMARK_SUBCATG TEXT,
    BENCHMARK_ITEM_SUB_DESC TEXT
);
"#,
    // Migration 3: scraped pricing
    r#"
CREATE TABLE IF NOT EXISTS Pricing (
    ITEM_ID TEXT NOT NULL,
    PRODUCT_PRICE REAL,
    BENCHMARK_ID INTEGER,
    BENCHMARK_BASE_PRICE REAL,
    BENCHMARK_SITE_PRICE REAL,
    PRICE_SCRAPE_DATE TEXT
);
"#,
    r#"CREATE INDEX IF NOT EXISTS idx_pricing_item ON Pricing(ITEM_ID);"#,
    r#"CREATE INDEX IF NOT EXISTS idx_pricing_benchmark ON Pricing(BENCHMARK_ID, PRICE_SCRAPE_DATE);"#,
    // Migration 4: marketplace merchants
    r#"
CREATE TABLE IF NOT EXISTS Third_Party_Merchants (
    MERCHANT_ID INTEGER PRIMARY KEY,
    THIRD_PARTY_MERCHANT_NAME TEXT NOT NULL
);
"#,
    // Migration 5: sales fact table
    r#"
CREATE TABLE IF NOT EXISTS Sales (
    SALE_ID INTEGER PRIMARY KEY,
    ITEM_ID TEXT NOT NULL,
    MERCHANT_ID INTEGER,
    CUSTOMER_ID INTEGER NOT NULL,
    SALE_DATE TEXT NOT NULL,
    QUANTITY_SOLD INTEGER NOT NULL DEFAULT 0,
    SALE_PRICE REAL NOT NULL DEFAULT 0,
    TOTAL_SALE_AMOUNT REAL NOT NULL DEFAULT 0,
    DISCOUNT_APPLIED REAL NOT NULL DEFAULT 0,
    PAYMENT_METHOD TEXT
);
"#,
    r#"CREATE INDEX IF NOT EXISTS idx_sales_date ON Sales(SALE_DATE);"#,
    r#"CREATE INDEX IF NOT EXISTS idx_sales_item ON Sales(ITEM_ID);"#,
    r#"CREATE INDEX IF NOT EXISTS idx_sales_customer ON Sales(CUSTOMER_ID);"#,
    // Migration 6: reviews
    r#"
CREATE TABLE IF NOT EXISTS Reviews (
    ITEM_ID TEXT NOT NULL,
    ITEM_REVIEW_RATING REAL,
    ITEM_REVIEW_COUNT INTEGER NOT NULL DEFAULT 0
);
"#,
    r#"CREATE INDEX IF NOT EXISTS idx_reviews_item ON Reviews(ITEM_ID);"#,
    // Migration 7: availability
    r#"
CREATE TABLE IF NOT EXISTS Availability (
    ITEM_ID TEXT NOT NULL,
    AVAILABILITY_INDICATOR TEXT NOT NULL
);
"#,
    r#"CREATE INDEX IF NOT EXISTS idx_availability_item ON Availability(ITEM_ID);"#,
];
