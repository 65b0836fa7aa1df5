use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{Product, ProductRequest, StockUpdateRequest},
    queries::product_queries::{self, NewProduct, ProductChanges},
    utils::{extractors::extract_user_id, jwt::Claims},
};

fn validate_price(price: f64) -> Result<()> {
    if !price.is_finite() || price <= 0.0 {
        return Err(AppError::BadRequest("Price must be greater than zero".to_string()));
    }
    Ok(())
}

fn validate_stock(stock: i64) -> Result<()> {
    if stock < 0 {
        return Err(AppError::BadRequest("Stock cannot be negative".to_string()));
    }
    Ok(())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub async fn list_my_products(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Product>>> {
    let farmer_id = extract_user_id(&claims)?;
    let products = product_queries::list_by_farmer(&state.db, farmer_id).await?;

    Ok(Json(products))
}

pub async fn create_product(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    let farmer_id = extract_user_id(&claims)?;

    let name = non_empty(payload.name.as_deref())
        .ok_or_else(|| AppError::BadRequest("name is required".to_string()))?;
    let price = payload
        .price
        .ok_or_else(|| AppError::BadRequest("price is required".to_string()))?;
    validate_price(price)?;
    let stock = payload.stock.unwrap_or(0);
    validate_stock(stock)?;

    let product = product_queries::create_product(
        &state.db,
        &NewProduct {
            farmer_id,
            name,
            description: non_empty(payload.description.as_deref()),
            price,
            image_url: non_empty(payload.image_url.as_deref()),
            stock,
        },
    )
    .await?;

    tracing::info!("Farmer {} created product {}", farmer_id, product.id);

    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<ProductRequest>,
) -> Result<Json<Product>> {
    let farmer_id = extract_user_id(&claims)?;

    if let Some(name) = payload.name.as_deref() {
        if name.trim().is_empty() {
            return Err(AppError::BadRequest("name cannot be empty".to_string()));
        }
    }
    if let Some(price) = payload.price {
        validate_price(price)?;
    }
    if let Some(stock) = payload.stock {
        validate_stock(stock)?;
    }

    let changes = ProductChanges {
        name: payload.name.as_deref().map(str::trim),
        description: payload.description.as_deref(),
        price: payload.price,
        image_url: payload.image_url.as_deref(),
        stock: payload.stock,
    };

    let product = product_queries::update_product(&state.db, id, farmer_id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product with id {} not found", id)))?;

    Ok(Json(product))
}

pub async fn set_stock(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<StockUpdateRequest>,
) -> Result<Json<Product>> {
    let farmer_id = extract_user_id(&claims)?;
    validate_stock(payload.stock)?;

    let product = product_queries::set_stock(&state.db, id, farmer_id, payload.stock)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product with id {} not found", id)))?;

    Ok(Json(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let farmer_id = extract_user_id(&claims)?;

    if product_queries::delete_product(&state.db, id, farmer_id).await? == 0 {
        return Err(AppError::NotFound("Product not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
