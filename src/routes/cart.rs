use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{AddToCartRequest, CartItem, CartResponse, round_cents},
    queries::{cart_queries, product_queries},
    utils::{extractors::extract_user_id, jwt::Claims},
};

pub async fn get_cart(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<CartResponse>> {
    let buyer_id = extract_user_id(&claims)?;
    let items = cart_queries::get_lines(&state.db, buyer_id).await?;

    let total = round_cents(
        items
            .iter()
            .map(|line| line.unit_price * line.quantity as f64)
            .sum(),
    );

    Ok(Json(CartResponse { items, total }))
}

pub async fn add_to_cart(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<AddToCartRequest>,
) -> Result<Json<CartItem>> {
    let buyer_id = extract_user_id(&claims)?;

    if payload.quantity <= 0 {
        return Err(AppError::BadRequest("Quantity must be at least 1".to_string()));
    }

    let product = product_queries::find_by_id(&state.db, payload.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    let in_cart = cart_queries::quantity_in_cart(&state.db, buyer_id, product.id).await?;
    if in_cart + payload.quantity > product.stock {
        return Err(AppError::BadRequest(format!(
            "Only {} of {} left in stock",
            product.stock, product.name
        )));
    }

    let item = cart_queries::add_item(&state.db, buyer_id, product.id, payload.quantity).await?;

    Ok(Json(item))
}

pub async fn remove_from_cart(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(product_id): Path<i64>,
) -> Result<StatusCode> {
    let buyer_id = extract_user_id(&claims)?;

    if cart_queries::remove_item(&state.db, buyer_id, product_id).await? == 0 {
        return Err(AppError::NotFound("Item not in cart".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
