//! Schema bootstrap and in-place migrations.
//!
//! Every statement here must be safe to run against a database that already
//! has the schema, so `bootstrap` can run on every start.

use sqlx::SqlitePool;

use crate::error::Result;

const CREATE_USERS: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        full_name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        user_type TEXT NOT NULL CHECK (user_type IN ('farmer', 'buyer')),
        verification_token TEXT,
        verification_expires_at INTEGER,
        is_verified INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )";

// `stock` is added by `ensure_stock_column` so older databases pick it up too.
const CREATE_PRODUCTS: &str = "
    CREATE TABLE IF NOT EXISTS products (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        farmer_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        description TEXT,
        price REAL NOT NULL,
        image_url TEXT,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )";

const CREATE_CART_ITEMS: &str = "
    CREATE TABLE IF NOT EXISTS cart_items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        buyer_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        product_id INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
        quantity INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        UNIQUE (buyer_id, product_id)
    )";

const CREATE_ORDERS: &str = "
    CREATE TABLE IF NOT EXISTS orders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        buyer_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        farmer_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        product_id INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
        quantity INTEGER NOT NULL,
        unit_price REAL NOT NULL,
        total_price REAL NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending'
            CHECK (status IN ('pending', 'confirmed', 'completed', 'cancelled')),
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )";

const CREATE_OTP_CODES: &str = "
    CREATE TABLE IF NOT EXISTS otp_codes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT NOT NULL,
        code TEXT NOT NULL,
        purpose TEXT NOT NULL CHECK (purpose IN ('email_verification', 'password_reset')),
        expires_at INTEGER NOT NULL,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )";

const CREATE_INDEXES: [&str; 4] = [
    "CREATE INDEX IF NOT EXISTS idx_products_farmer ON products(farmer_id)",
    "CREATE INDEX IF NOT EXISTS idx_orders_buyer ON orders(buyer_id)",
    "CREATE INDEX IF NOT EXISTS idx_orders_farmer ON orders(farmer_id)",
    "CREATE INDEX IF NOT EXISTS idx_otp_codes_email ON otp_codes(email, purpose)",
];

pub const TABLES: [&str; 5] = ["users", "products", "cart_items", "orders", "otp_codes"];

pub async fn create_tables(pool: &SqlitePool) -> Result<()> {
    let mut tx = pool.begin().await?;

    for statement in [
        CREATE_USERS,
        CREATE_PRODUCTS,
        CREATE_CART_ITEMS,
        CREATE_ORDERS,
        CREATE_OTP_CODES,
    ]
    .into_iter()
    .chain(CREATE_INDEXES)
    {
        sqlx::query(statement).execute(&mut *tx).await?;
    }

    tx.commit().await?;
    Ok(())
}

pub async fn has_column(pool: &SqlitePool, table: &str, column: &str) -> Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info(?) WHERE name = ?")
            .bind(table)
            .bind(column)
            .fetch_one(pool)
            .await?;

    Ok(count > 0)
}

/// Adds `products.stock` when missing. Returns whether the column was added.
pub async fn ensure_stock_column(pool: &SqlitePool) -> Result<bool> {
    if has_column(pool, "products", "stock").await? {
        tracing::debug!("products.stock already present");
        return Ok(false);
    }

    sqlx::query("ALTER TABLE products ADD COLUMN stock INTEGER NOT NULL DEFAULT 0")
        .execute(pool)
        .await?;

    tracing::info!("Added products.stock column");
    Ok(true)
}

pub async fn bootstrap(pool: &SqlitePool) -> Result<()> {
    create_tables(pool).await?;
    ensure_stock_column(pool).await?;
    Ok(())
}

/// Row counts for every application table, in `TABLES` order.
pub async fn table_counts(pool: &SqlitePool) -> Result<Vec<(&'static str, i64)>> {
    let mut counts = Vec::with_capacity(TABLES.len());

    for table in TABLES {
        // Table names come from the constant list above, never from input.
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(pool)
            .await?;
        counts.push((table, count));
    }

    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{raw_memory_pool, setup_test_db};

    async fn user_tables(pool: &SqlitePool) -> Vec<String> {
        sqlx::query_scalar(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
             ORDER BY name",
        )
        .fetch_all(pool)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn bootstrap_is_idempotent() {
        let pool = setup_test_db().await;
        let before = user_tables(&pool).await;

        bootstrap(&pool).await.unwrap();
        bootstrap(&pool).await.unwrap();

        assert_eq!(user_tables(&pool).await, before);

        let stock_columns: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM pragma_table_info('products') WHERE name = 'stock'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(stock_columns, 1);
    }

    #[tokio::test]
    async fn stock_migration_upgrades_legacy_products_table() {
        let pool = raw_memory_pool().await;
        create_tables(&pool).await.unwrap();
        assert!(!has_column(&pool, "products", "stock").await.unwrap());

        assert!(ensure_stock_column(&pool).await.unwrap());
        assert!(!ensure_stock_column(&pool).await.unwrap());
        assert!(has_column(&pool, "products", "stock").await.unwrap());
    }

    #[tokio::test]
    async fn table_counts_cover_every_table() {
        let pool = setup_test_db().await;
        let counts = table_counts(&pool).await.unwrap();
        assert_eq!(counts.len(), TABLES.len());
        assert!(counts.iter().all(|(_, count)| *count == 0));
    }
}
