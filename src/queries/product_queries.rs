use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::{
    error::Result,
    models::{Product, ProductQuery},
};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

pub struct NewProduct<'a> {
    pub farmer_id: i64,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub price: f64,
    pub image_url: Option<&'a str>,
    pub stock: i64,
}

pub async fn create_product(pool: &SqlitePool, new_product: &NewProduct<'_>) -> Result<Product> {
    let product = sqlx::query_as::<_, Product>(
        "INSERT INTO products (farmer_id, name, description, price, image_url, stock)
         VALUES (?, ?, ?, ?, ?, ?)
         RETURNING *",
    )
    .bind(new_product.farmer_id)
    .bind(new_product.name)
    .bind(new_product.description)
    .bind(new_product.price)
    .bind(new_product.image_url)
    .bind(new_product.stock)
    .fetch_one(pool)
    .await?;

    Ok(product)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(product)
}

pub async fn search_products(pool: &SqlitePool, params: &ProductQuery) -> Result<Vec<Product>> {
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM products WHERE 1=1");

    // text search
    if let Some(q) = params.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = format!("%{}%", q);
        query.push(" AND (name LIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR description LIKE ");
        query.push_bind(pattern);
        query.push(")");
    }

    if let Some(farmer_id) = params.farmer_id {
        query.push(" AND farmer_id = ");
        query.push_bind(farmer_id);
    }

    if params.in_stock == Some(true) {
        query.push(" AND stock > 0");
    }

    let limit = params
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = params.offset.unwrap_or(0).max(0);

    query.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    query.push_bind(limit);
    query.push(" OFFSET ");
    query.push_bind(offset);

    let products = query.build_query_as::<Product>().fetch_all(pool).await?;

    Ok(products)
}

pub async fn list_by_farmer(pool: &SqlitePool, farmer_id: i64) -> Result<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE farmer_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(farmer_id)
    .fetch_all(pool)
    .await?;

    Ok(products)
}

pub struct ProductChanges<'a> {
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub price: Option<f64>,
    pub image_url: Option<&'a str>,
    pub stock: Option<i64>,
}

pub async fn update_product(
    pool: &SqlitePool,
    id: i64,
    farmer_id: i64,
    changes: &ProductChanges<'_>,
) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        "UPDATE products
         SET
             name = COALESCE(?, name),
             description = COALESCE(?, description),
             price = COALESCE(?, price),
             image_url = COALESCE(?, image_url),
             stock = COALESCE(?, stock)
         WHERE id = ? AND farmer_id = ?
         RETURNING *",
    )
    .bind(changes.name)
    .bind(changes.description)
    .bind(changes.price)
    .bind(changes.image_url)
    .bind(changes.stock)
    .bind(id)
    .bind(farmer_id)
    .fetch_optional(pool)
    .await?;

    Ok(product)
}

pub async fn set_stock(
    pool: &SqlitePool,
    id: i64,
    farmer_id: i64,
    stock: i64,
) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        "UPDATE products SET stock = ? WHERE id = ? AND farmer_id = ? RETURNING *",
    )
    .bind(stock)
    .bind(id)
    .bind(farmer_id)
    .fetch_optional(pool)
    .await?;

    Ok(product)
}

pub async fn delete_product(pool: &SqlitePool, id: i64, farmer_id: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM products WHERE id = ? AND farmer_id = ?")
        .bind(id)
        .bind(farmer_id)
        .execute(pool)
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
    async fn search_filters_by_text_and_stock() {
        let pool = setup_test_db().await;
        let farmer = insert_user(&pool, "farmer@example.com", UserType::Farmer).await;
        insert_product(&pool, farmer.id, "Organic Tomatoes", 2.5, 10).await;
        insert_product(&pool, farmer.id, "Brown Rice", 1.2, 0).await;

        let tomatoes = search_products(
            &pool,
            &ProductQuery {
                q: Some("tomato".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(tomatoes.len(), 1);
        assert_eq!(tomatoes[0].name, "Organic Tomatoes");

        let in_stock = search_products(
            &pool,
            &ProductQuery {
                in_stock: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(in_stock.len(), 1);
    }

    #[tokio::test]
    async fn owners_only_can_change_products() {
        let pool = setup_test_db().await;
        let farmer = insert_user(&pool, "farmer@example.com", UserType::Farmer).await;
        let other = insert_user(&pool, "other@example.com", UserType::Farmer).await;
        let product = insert_product(&pool, farmer.id, "Maize", 0.8, 5).await;

        assert!(set_stock(&pool, product.id, other.id, 50).await.unwrap().is_none());
        assert_eq!(delete_product(&pool, product.id, other.id).await.unwrap(), 0);

        let updated = update_product(
            &pool,
            product.id,
            farmer.id,
            &ProductChanges {
                name: None,
                description: Some("Yellow maize"),
                price: Some(0.9),
                image_url: None,
                stock: None,
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(updated.name, "Maize");
        assert_eq!(updated.price, 0.9);
        assert_eq!(updated.stock, 5);
        assert_eq!(updated.description.as_deref(), Some("Yellow maize"));
    }
}
