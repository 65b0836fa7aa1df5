use axum::{Json, extract::State, http::StatusCode};
use chrono::{Duration, Utc};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{ApiMessage, RegisterRequest},
    queries::user_queries::{self, NewUser},
    services::email_service,
    utils::{
        codes,
        extractors::{normalize_email, validate_email},
    },
};

pub const MIN_PASSWORD_LENGTH: usize = 8;

pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiMessage>)> {
    validate_registration(&payload)?;

    let email = normalize_email(&payload.email);

    if user_queries::find_by_email(&state.db, &email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password_hash = bcrypt::hash(&payload.password, state.config.auth.bcrypt_cost)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {}", e)))?;

    let ttl_hours = state.config.verification.token_ttl_hours;
    let token = codes::generate_verification_token();
    let expires_at = (Utc::now() + Duration::hours(ttl_hours)).timestamp();

    let user = user_queries::create_user(
        &state.db,
        &NewUser {
            full_name: payload.full_name.trim(),
            email: &email,
            password_hash: &password_hash,
            user_type: payload.user_type,
            verification_token: Some(&token),
            verification_expires_at: Some(expires_at),
        },
    )
    .await?;

    tracing::info!("Registered user {} ({:?})", user.id, user.user_type);

    let link = state.config.verification_link(&token);
    let message = match email_service::send_verification_email(
        state.mailer.as_ref(),
        &user.email,
        Some(&user.full_name),
        &link,
        ttl_hours,
    )
    .await
    {
        Ok(_) => "Registration successful. Please check your email to verify your account.",
        Err(e) => {
            tracing::warn!("Verification email for user {} not sent: {}", user.id, e);
            "Registration successful, but the verification email could not be sent. \
             Please request a new verification link."
        }
    };

    Ok((StatusCode::CREATED, Json(ApiMessage::ok(message))))
}

fn validate_registration(payload: &RegisterRequest) -> Result<()> {
    validate_email(payload.email.trim())?;

    if payload.full_name.trim().is_empty() {
        return Err(AppError::BadRequest("Full name cannot be empty".to_string()));
    }

    validate_password(&payload.password)
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}
