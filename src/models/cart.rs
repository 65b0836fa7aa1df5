use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CartItem {
    pub id: i64,
    pub buyer_id: i64,
    pub product_id: i64,
    pub quantity: i64,
}

/// Cart line joined with its product, as shown to the buyer and used at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CartLine {
    pub product_id: i64,
    pub farmer_id: i64,
    pub product_name: String,
    pub unit_price: f64,
    pub quantity: i64,
    pub stock: i64,
}

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub items: Vec<CartLine>,
    pub total: f64,
}
