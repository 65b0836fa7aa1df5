mod cart;
mod diagnostics;
mod farmer_products;
mod health;
mod login;
mod orders;
mod otp;
mod products;
mod register;
mod verification;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post, put},
};

use crate::{
    AppState,
    middleware::{auth_middleware, buyer_middleware, farmer_middleware},
};

pub use verification::INVALID_LINK_MESSAGE;

pub fn create_router(state: AppState) -> Router<AppState> {
    let farmer = Router::new()
        .route(
            "/products",
            get(farmer_products::list_my_products).post(farmer_products::create_product),
        )
        .route(
            "/products/{id}",
            put(farmer_products::update_product).delete(farmer_products::delete_product),
        )
        .route("/products/{id}/stock", patch(farmer_products::set_stock))
        .route("/orders", get(orders::list_farmer_orders))
        .route("/orders/{id}/status", patch(orders::update_order_status))
        .route_layer(from_fn_with_state(state.clone(), farmer_middleware));

    let buyer = Router::new()
        .route("/cart", get(cart::get_cart).post(cart::add_to_cart))
        .route("/cart/{product_id}", delete(cart::remove_from_cart))
        .route("/orders", get(orders::list_my_orders))
        .route("/orders/checkout", post(orders::checkout))
        .route_layer(from_fn_with_state(state.clone(), buyer_middleware));

    let account = Router::new()
        .route("/auth/me", get(login::current_user))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let router = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/auth/register", post(register::register_user))
        .route("/auth/login", post(login::login_user))
        .route("/auth/otp/send", post(otp::send_otp))
        .route("/auth/otp/verify", post(otp::verify_otp))
        .route("/auth/password/forgot", post(otp::forgot_password))
        .route("/auth/password/reset", post(otp::reset_password))
        .route("/verify", get(verification::verify_email))
        .route("/api/send-verification", post(verification::send_verification))
        .route("/products", get(products::list_products))
        .route("/products/{id}", get(products::get_product))
        .nest("/farmer", farmer)
        .merge(buyer)
        .merge(account);

    if state.config.diagnostics_enabled {
        router.nest("/diagnostics", diagnostics::router())
    } else {
        router
    }
}
