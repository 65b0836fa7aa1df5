//! Sample rows for local development. Safe to run repeatedly.

use sqlx::SqlitePool;

use crate::{
    error::{AppError, Result},
    models::UserType,
};

pub const SAMPLE_PASSWORD: &str = "password123";
pub const SAMPLE_FARMER_EMAIL: &str = "farmer@agrimarket.test";
pub const SAMPLE_BUYER_EMAIL: &str = "buyer@agrimarket.test";

const SAMPLE_PRODUCTS: [(&str, &str, f64, i64); 4] = [
    ("Fresh Tomatoes", "Vine-ripened tomatoes picked this week", 2.50, 100),
    ("Organic Potatoes", "Washed potatoes from certified organic fields", 1.80, 200),
    ("Green Beans", "Tender beans, sold per kilogram", 3.20, 50),
    ("Free-range Eggs", "One dozen eggs from pasture-raised hens", 4.00, 30),
];

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub users_inserted: u64,
    pub products_inserted: u64,
}

async fn insert_sample_user(
    pool: &SqlitePool,
    full_name: &str,
    email: &str,
    password_hash: &str,
    user_type: UserType,
) -> Result<u64> {
    let result = sqlx::query(
        "INSERT INTO users (full_name, email, password_hash, user_type, is_verified)
         VALUES (?, ?, ?, ?, 1)
         ON CONFLICT (email) DO NOTHING",
    )
    .bind(full_name)
    .bind(email)
    .bind(password_hash)
    .bind(user_type)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn seed_sample_data(pool: &SqlitePool, bcrypt_cost: u32) -> Result<SeedSummary> {
    let password_hash = bcrypt::hash(SAMPLE_PASSWORD, bcrypt_cost)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {}", e)))?;

    let mut summary = SeedSummary::default();

    summary.users_inserted += insert_sample_user(
        pool,
        "Sample Farmer",
        SAMPLE_FARMER_EMAIL,
        &password_hash,
        UserType::Farmer,
    )
    .await?;
    summary.users_inserted += insert_sample_user(
        pool,
        "Sample Buyer",
        SAMPLE_BUYER_EMAIL,
        &password_hash,
        UserType::Buyer,
    )
    .await?;

    let farmer_id: i64 = sqlx::query_scalar("SELECT id FROM users WHERE email = ?")
        .bind(SAMPLE_FARMER_EMAIL)
        .fetch_one(pool)
        .await?;

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE farmer_id = ?")
        .bind(farmer_id)
        .fetch_one(pool)
        .await?;

    if existing == 0 {
        let mut tx = pool.begin().await?;
        for (name, description, price, stock) in SAMPLE_PRODUCTS {
            sqlx::query(
                "INSERT INTO products (farmer_id, name, description, price, stock)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(farmer_id)
            .bind(name)
            .bind(description)
            .bind(price)
            .bind(stock)
            .execute(&mut *tx)
            .await?;
            summary.products_inserted += 1;
        }
        tx.commit().await?;
    }

    Ok(summary)
}
