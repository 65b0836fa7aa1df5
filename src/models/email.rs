use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum OtpPurpose {
    EmailVerification,
    PasswordReset,
}

impl OtpPurpose {
    pub fn subject(self) -> &'static str {
        match self {
            OtpPurpose::EmailVerification => "Your AgriMarket verification code",
            OtpPurpose::PasswordReset => "Your AgriMarket password reset code",
        }
    }

    pub fn action(self) -> &'static str {
        match self {
            OtpPurpose::EmailVerification => "verify your email address",
            OtpPurpose::PasswordReset => "reset your password",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct OtpCode {
    pub id: i64,
    pub email: String,
    pub code: String,
    pub purpose: OtpPurpose,
    pub expires_at: i64,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub struct SendOtpRequest {
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct OtpDiagnosticQuery {
    pub email: Option<String>,
}
