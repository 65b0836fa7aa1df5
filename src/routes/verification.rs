use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::Html,
};
use chrono::{Duration, Utc};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{ApiMessage, SendVerificationRequest, VerifyQuery},
    queries::user_queries,
    services::email_service,
    utils::{
        codes,
        extractors::{normalize_email, validate_email},
        html,
    },
};

pub const INVALID_LINK_MESSAGE: &str = "Invalid or expired verification link.";

pub async fn verify_email(
    State(state): State<AppState>,
    Query(params): Query<VerifyQuery>,
) -> Result<(StatusCode, Html<String>)> {
    let token = params
        .token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let verified = match token {
        Some(token) => {
            user_queries::verify_by_token(&state.db, token, Utc::now().timestamp()).await?
        }
        None => None,
    };

    let response = match verified {
        Some(user) => {
            tracing::info!("Email verified for user {}", user.id);
            (
                StatusCode::OK,
                Html(html::render_page(
                    "Email verified",
                    &html::status_line(true, "Your email has been verified. You can now log in."),
                )),
            )
        }
        None => (
            StatusCode::BAD_REQUEST,
            Html(html::render_page(
                "Verification failed",
                &html::status_line(false, INVALID_LINK_MESSAGE),
            )),
        ),
    };

    Ok(response)
}

pub async fn send_verification(
    State(state): State<AppState>,
    Json(payload): Json<SendVerificationRequest>,
) -> Result<Json<ApiMessage>> {
    validate_email(payload.email.trim())?;
    let email = normalize_email(&payload.email);

    let user = user_queries::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| AppError::NotFound("No account found for this email address".to_string()))?;

    if user.is_verified {
        return Err(AppError::BadRequest("Email is already verified".to_string()));
    }

    let ttl_hours = state.config.verification.token_ttl_hours;
    let token = codes::generate_verification_token();
    let expires_at = (Utc::now() + Duration::hours(ttl_hours)).timestamp();

    user_queries::set_verification_token(&state.db, user.id, &token, expires_at).await?;

    email_service::send_verification_email(
        state.mailer.as_ref(),
        &user.email,
        Some(&user.full_name),
        &state.config.verification_link(&token),
        ttl_hours,
    )
    .await?;

    tracing::info!("Verification email re-sent for user {}", user.id);

    Ok(Json(ApiMessage::ok(
        "Verification email sent. Please check your inbox.",
    )))
}
