use axum::{Json, extract::State};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{
        ApiMessage, ForgotPasswordRequest, OtpPurpose, ResetPasswordRequest, SendOtpRequest,
        VerifyOtpRequest,
    },
    queries::{otp_queries, user_queries},
    routes::register::validate_password,
    services::email_service,
    utils::{
        codes,
        extractors::{normalize_email, validate_email},
    },
};

const INVALID_CODE_MESSAGE: &str = "Invalid or expired code.";
const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account exists for this email, a reset code has been sent.";

async fn issue_code(
    state: &AppState,
    email: &str,
    name: Option<&str>,
    purpose: OtpPurpose,
) -> Result<()> {
    let ttl_minutes = state.config.verification.otp_ttl_minutes;
    let code = codes::generate_otp();

    otp_queries::replace_code(&state.db, email, &code, purpose, ttl_minutes).await?;

    email_service::send_otp_email(
        state.mailer.as_ref(),
        email,
        name,
        &code,
        purpose,
        ttl_minutes,
    )
    .await?;

    tracing::info!("{:?} code sent to {}", purpose, email);
    Ok(())
}

async fn consume(state: &AppState, email: &str, code: &str, purpose: OtpPurpose) -> Result<()> {
    let code = code.trim();
    if !codes::is_well_formed_otp(code)
        || !otp_queries::consume_code(&state.db, email, code, purpose).await?
    {
        return Err(AppError::Unauthorized(INVALID_CODE_MESSAGE.to_string()));
    }
    Ok(())
}

pub async fn send_otp(
    State(state): State<AppState>,
    Json(payload): Json<SendOtpRequest>,
) -> Result<Json<ApiMessage>> {
    validate_email(payload.email.trim())?;
    let email = normalize_email(&payload.email);

    let name = match payload.name {
        Some(name) => Some(name),
        None => user_queries::find_by_email(&state.db, &email)
            .await?
            .map(|user| user.full_name),
    };

    issue_code(&state, &email, name.as_deref(), OtpPurpose::EmailVerification).await?;

    Ok(Json(ApiMessage::ok("Verification code sent")))
}

pub async fn verify_otp(
    State(state): State<AppState>,
    Json(payload): Json<VerifyOtpRequest>,
) -> Result<Json<ApiMessage>> {
    let email = normalize_email(&payload.email);

    consume(&state, &email, &payload.code, OtpPurpose::EmailVerification).await?;

    if user_queries::mark_verified_by_email(&state.db, &email).await? {
        tracing::info!("Account for {} verified by code", email);
    }

    Ok(Json(ApiMessage::ok("Email verified")))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<ApiMessage>> {
    validate_email(payload.email.trim())?;
    let email = normalize_email(&payload.email);

    // The answer must not reveal whether the account exists.
    match user_queries::find_by_email(&state.db, &email).await? {
        Some(user) => {
            if let Err(e) =
                issue_code(&state, &email, Some(&user.full_name), OtpPurpose::PasswordReset).await
            {
                tracing::warn!("Password reset code for user {} not delivered: {}", user.id, e);
            }
        }
        None => tracing::debug!("Password reset requested for unknown email"),
    }

    Ok(Json(ApiMessage::ok(FORGOT_PASSWORD_MESSAGE)))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<ApiMessage>> {
    validate_password(&payload.new_password)?;
    let email = normalize_email(&payload.email);

    consume(&state, &email, &payload.code, OtpPurpose::PasswordReset).await?;

    let password_hash = bcrypt::hash(&payload.new_password, state.config.auth.bcrypt_cost)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {}", e)))?;

    if !user_queries::update_password(&state.db, &email, &password_hash).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    tracing::info!("Password reset for {}", email);

    Ok(Json(ApiMessage::ok(
        "Password has been reset. You can now log in.",
    )))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        models::UserType,
        test_utils::{RecordingMailer, insert_user, test_state},
    };

    async fn forgot(state: &AppState, email: &str) -> ApiMessage {
        let Json(message) = forgot_password(
            State(state.clone()),
            Json(ForgotPasswordRequest {
                email: email.to_string(),
            }),
        )
        .await
        .unwrap();
        message
    }

    #[tokio::test]
    async fn forgot_password_answers_alike_when_delivery_fails() {
        let state = test_state(Arc::new(RecordingMailer::failing())).await;
        insert_user(&state.db, "known@example.com", UserType::Buyer).await;

        let known = forgot(&state, "known@example.com").await;
        let unknown = forgot(&state, "unknown@example.com").await;

        assert!(known.success && unknown.success);
        assert_eq!(known.message, unknown.message);
        assert_eq!(known.message, FORGOT_PASSWORD_MESSAGE);
    }

    #[tokio::test]
    async fn forgot_password_mails_only_known_accounts() {
        let mailer = Arc::new(RecordingMailer::default());
        let state = test_state(mailer.clone()).await;
        insert_user(&state.db, "known@example.com", UserType::Buyer).await;

        forgot(&state, "unknown@example.com").await;
        assert!(mailer.sent().is_empty());

        forgot(&state, "Known@Example.com").await;
        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to_address, "known@example.com");
        assert_eq!(sent[0].subject, OtpPurpose::PasswordReset.subject());
    }
}
