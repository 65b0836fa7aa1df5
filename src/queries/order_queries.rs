use sqlx::SqlitePool;

use crate::{
    error::Result,
    models::{Order, OrderStatus, round_cents},
    queries::cart_queries,
};

// These transactions read before they write, so they take the write lock at BEGIN.
const BEGIN_WRITE: &str = "BEGIN IMMEDIATE";

#[derive(Debug)]
pub enum CheckoutOutcome {
    Placed(Vec<Order>),
    EmptyCart,
    InsufficientStock { product_id: i64, product_name: String },
}

#[derive(Debug)]
pub enum StatusChange {
    Updated(Order),
    NotFound,
    InvalidTransition(OrderStatus),
}

/// Turns the buyer's cart into one order per line. Stock decrements, order
/// inserts and the cart clear commit together or not at all.
pub async fn place_orders_from_cart(pool: &SqlitePool, buyer_id: i64) -> Result<CheckoutOutcome> {
    let mut tx = pool.begin_with(BEGIN_WRITE).await?;

    let lines = cart_queries::get_lines(&mut *tx, buyer_id).await?;
    if lines.is_empty() {
        tx.rollback().await?;
        return Ok(CheckoutOutcome::EmptyCart);
    }

    let mut orders = Vec::with_capacity(lines.len());

    for line in &lines {
        let decremented = sqlx::query(
            "UPDATE products SET stock = stock - ? WHERE id = ? AND stock >= ?",
        )
        .bind(line.quantity)
        .bind(line.product_id)
        .bind(line.quantity)
        .execute(&mut *tx)
        .await?;

        if decremented.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(CheckoutOutcome::InsufficientStock {
                product_id: line.product_id,
                product_name: line.product_name.clone(),
            });
        }

        let order = sqlx::query_as::<_, Order>(
            "INSERT INTO orders
                (buyer_id, farmer_id, product_id, quantity, unit_price, total_price, status)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(buyer_id)
        .bind(line.farmer_id)
        .bind(line.product_id)
        .bind(line.quantity)
        .bind(line.unit_price)
        .bind(round_cents(line.unit_price * line.quantity as f64))
        .bind(OrderStatus::Pending)
        .fetch_one(&mut *tx)
        .await?;

        orders.push(order);
    }

    cart_queries::clear(&mut *tx, buyer_id).await?;

    tx.commit().await?;
    Ok(CheckoutOutcome::Placed(orders))
}

pub async fn list_for_buyer(pool: &SqlitePool, buyer_id: i64) -> Result<Vec<Order>> {
    let orders = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE buyer_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(buyer_id)
    .fetch_all(pool)
    .await?;

    Ok(orders)
}

pub async fn list_for_farmer(pool: &SqlitePool, farmer_id: i64) -> Result<Vec<Order>> {
    let orders = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE farmer_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(farmer_id)
    .fetch_all(pool)
    .await?;

    Ok(orders)
}

/// Moves a farmer's order to `next`. Cancelling puts the quantity back in stock.
pub async fn update_status(
    pool: &SqlitePool,
    order_id: i64,
    farmer_id: i64,
    next: OrderStatus,
) -> Result<StatusChange> {
    let mut tx = pool.begin_with(BEGIN_WRITE).await?;

    let current = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE id = ? AND farmer_id = ?",
    )
    .bind(order_id)
    .bind(farmer_id)
    .fetch_optional(&mut *tx)
    .await?;

    let current = match current {
        Some(order) => order,
        None => {
            tx.rollback().await?;
            return Ok(StatusChange::NotFound);
        }
    };

    if !current.status.can_transition_to(next) {
        tx.rollback().await?;
        return Ok(StatusChange::InvalidTransition(current.status));
    }

    // Guarded on the old status so a concurrent change wins cleanly.
    let updated = sqlx::query_as::<_, Order>(
        "UPDATE orders SET status = ? WHERE id = ? AND status = ? RETURNING *",
    )
    .bind(next)
    .bind(order_id)
    .bind(current.status)
    .fetch_optional(&mut *tx)
    .await?;

    let updated = match updated {
        Some(order) => order,
        None => {
            tx.rollback().await?;
            return Ok(StatusChange::InvalidTransition(current.status));
        }
    };

    if next == OrderStatus::Cancelled {
        sqlx::query("UPDATE products SET stock = stock + ? WHERE id = ?")
            .bind(updated.quantity)
            .bind(updated.product_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(StatusChange::Updated(updated))
}
