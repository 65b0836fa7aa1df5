use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{AppState, error::AppError, models::UserType, utils::jwt::Claims};

fn bearer_claims(state: &AppState, req: &Request) -> Result<Claims, AppError> {
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid token format".to_string()))?;

    crate::utils::jwt::verify_token(&state.config.auth.jwt_secret, token)
}

async fn require_user_type(
    state: &AppState,
    mut req: Request,
    next: Next,
    user_type: UserType,
    denied: &str,
) -> Result<Response, AppError> {
    let claims = bearer_claims(state, &req)?;

    if claims.user_type != user_type {
        return Err(AppError::Forbidden(denied.to_string()));
    }

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = bearer_claims(&state, &req)?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

pub async fn farmer_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    require_user_type(&state, req, next, UserType::Farmer, "Farmer account required").await
}

pub async fn buyer_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    require_user_type(&state, req, next, UserType::Buyer, "Buyer account required").await
}
