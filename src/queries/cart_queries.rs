use sqlx::{Executor, Sqlite, SqlitePool};

use crate::{
    error::Result,
    models::{CartItem, CartLine},
};

/// Adds `quantity` to the buyer's line for the product, creating it if needed.
pub async fn add_item(
    pool: &SqlitePool,
    buyer_id: i64,
    product_id: i64,
    quantity: i64,
) -> Result<CartItem> {
    let item = sqlx::query_as::<_, CartItem>(
        "INSERT INTO cart_items (buyer_id, product_id, quantity)
         VALUES (?, ?, ?)
         ON CONFLICT (buyer_id, product_id)
         DO UPDATE SET quantity = cart_items.quantity + excluded.quantity
         RETURNING id, buyer_id, product_id, quantity",
    )
    .bind(buyer_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_one(pool)
    .await?;

    Ok(item)
}

/// Quantity of the product already in the buyer's cart, 0 when absent.
pub async fn quantity_in_cart(pool: &SqlitePool, buyer_id: i64, product_id: i64) -> Result<i64> {
    let quantity: Option<i64> = sqlx::query_scalar(
        "SELECT quantity FROM cart_items WHERE buyer_id = ? AND product_id = ?",
    )
    .bind(buyer_id)
    .bind(product_id)
    .fetch_optional(pool)
    .await?;

    Ok(quantity.unwrap_or(0))
}

pub async fn get_lines<'e, E>(executor: E, buyer_id: i64) -> Result<Vec<CartLine>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let lines = sqlx::query_as::<_, CartLine>(
        "SELECT p.id AS product_id, p.farmer_id, p.name AS product_name,
                p.price AS unit_price, c.quantity, p.stock
         FROM cart_items c
         JOIN products p ON p.id = c.product_id
         WHERE c.buyer_id = ?
         ORDER BY c.id",
    )
    .bind(buyer_id)
    .fetch_all(executor)
    .await?;

    Ok(lines)
}

pub async fn remove_item(pool: &SqlitePool, buyer_id: i64, product_id: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM cart_items WHERE buyer_id = ? AND product_id = ?")
        .bind(buyer_id)
        .bind(product_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn clear<'e, E>(executor: E, buyer_id: i64) -> Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM cart_items WHERE buyer_id = ?")
        .bind(buyer_id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::UserType,
        test_utils::{insert_product, insert_user, setup_test_db},
    };

    #[tokio::test]
    async fn adding_same_product_accumulates_quantity() {
        let pool = setup_test_db().await;
        let farmer = insert_user(&pool, "farmer@example.com", UserType::Farmer).await;
        let buyer = insert_user(&pool, "buyer@example.com", UserType::Buyer).await;
        let product = insert_product(&pool, farmer.id, "Beans", 3.0, 10).await;

        add_item(&pool, buyer.id, product.id, 2).await.unwrap();
        let item = add_item(&pool, buyer.id, product.id, 3).await.unwrap();
        assert_eq!(item.quantity, 5);
        assert_eq!(quantity_in_cart(&pool, buyer.id, product.id).await.unwrap(), 5);
        assert_eq!(quantity_in_cart(&pool, farmer.id, product.id).await.unwrap(), 0);

        let lines = get_lines(&pool, buyer.id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].product_name, "Beans");
        assert_eq!(lines[0].farmer_id, farmer.id);

        assert_eq!(remove_item(&pool, buyer.id, product.id).await.unwrap(), 1);
        assert!(get_lines(&pool, buyer.id).await.unwrap().is_empty());
    }
}
