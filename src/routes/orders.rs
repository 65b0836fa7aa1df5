use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{CheckoutResponse, Order, OrderStatusRequest, round_cents},
    queries::order_queries::{self, CheckoutOutcome, StatusChange},
    utils::{extractors::extract_user_id, jwt::Claims},
};

pub async fn checkout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<(StatusCode, Json<CheckoutResponse>)> {
    let buyer_id = extract_user_id(&claims)?;

    match order_queries::place_orders_from_cart(&state.db, buyer_id).await? {
        CheckoutOutcome::Placed(orders) => {
            let total = round_cents(orders.iter().map(|o| o.total_price).sum());
            tracing::info!(
                "Buyer {} placed {} orders totalling {:.2}",
                buyer_id,
                orders.len(),
                total
            );
            Ok((StatusCode::CREATED, Json(CheckoutResponse { orders, total })))
        }
        CheckoutOutcome::EmptyCart => Err(AppError::BadRequest("Cart is empty".to_string())),
        CheckoutOutcome::InsufficientStock {
            product_id,
            product_name,
        } => {
            tracing::warn!("Checkout for buyer {} blocked by stock of product {}", buyer_id, product_id);
            Err(AppError::Conflict(format!(
                "Insufficient stock for {}",
                product_name
            )))
        }
    }
}

pub async fn list_my_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Order>>> {
    let buyer_id = extract_user_id(&claims)?;
    let orders = order_queries::list_for_buyer(&state.db, buyer_id).await?;

    Ok(Json(orders))
}

pub async fn list_farmer_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Order>>> {
    let farmer_id = extract_user_id(&claims)?;
    let orders = order_queries::list_for_farmer(&state.db, farmer_id).await?;

    Ok(Json(orders))
}

pub async fn update_order_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<OrderStatusRequest>,
) -> Result<Json<Order>> {
    let farmer_id = extract_user_id(&claims)?;

    match order_queries::update_status(&state.db, id, farmer_id, payload.status).await? {
        StatusChange::Updated(order) => {
            tracing::info!("Order {} moved to {:?}", order.id, order.status);
            Ok(Json(order))
        }
        StatusChange::NotFound => Err(AppError::NotFound("Order not found".to_string())),
        StatusChange::InvalidTransition(current) => Err(AppError::BadRequest(format!(
            "Cannot change order from {:?} to {:?}",
            current, payload.status
        ))),
    }
}
