use chrono::{Duration, Utc};
use sqlx::SqlitePool;

use crate::{
    error::Result,
    models::{OtpCode, OtpPurpose},
};

/// Stores a fresh code, dropping earlier codes for the same email and purpose.
pub async fn replace_code(
    pool: &SqlitePool,
    email: &str,
    code: &str,
    purpose: OtpPurpose,
    ttl_minutes: i64,
) -> Result<OtpCode> {
    let expires_at = (Utc::now() + Duration::minutes(ttl_minutes)).timestamp();

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM otp_codes WHERE email = ? AND purpose = ?")
        .bind(email)
        .bind(purpose)
        .execute(&mut *tx)
        .await?;

    let otp = sqlx::query_as::<_, OtpCode>(
        "INSERT INTO otp_codes (email, code, purpose, expires_at)
         VALUES (?, ?, ?, ?)
         RETURNING *",
    )
    .bind(email)
    .bind(code)
    .bind(purpose)
    .bind(expires_at)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(otp)
}

/// Deletes a matching unexpired code. Returns whether one was consumed.
pub async fn consume_code(
    pool: &SqlitePool,
    email: &str,
    code: &str,
    purpose: OtpPurpose,
) -> Result<bool> {
    let consumed: Option<i64> = sqlx::query_scalar(
        "DELETE FROM otp_codes
         WHERE email = ? AND code = ? AND purpose = ? AND expires_at > ?
         RETURNING id",
    )
    .bind(email)
    .bind(code)
    .bind(purpose)
    .bind(Utc::now().timestamp())
    .fetch_optional(pool)
    .await?;

    Ok(consumed.is_some())
}

pub async fn cleanup_expired_codes(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM otp_codes WHERE expires_at <= ?")
        .bind(Utc::now().timestamp())
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    #[tokio::test]
    async fn codes_are_single_use() {
        let pool = setup_test_db().await;
        replace_code(&pool, "a@b.co", "123456", OtpPurpose::EmailVerification, 5)
            .await
            .unwrap();

        assert!(consume_code(&pool, "a@b.co", "123456", OtpPurpose::EmailVerification).await.unwrap());
        assert!(!consume_code(&pool, "a@b.co", "123456", OtpPurpose::EmailVerification).await.unwrap());
    }

    #[tokio::test]
    async fn codes_are_scoped_by_purpose() {
        let pool = setup_test_db().await;
        replace_code(&pool, "a@b.co", "123456", OtpPurpose::PasswordReset, 5)
            .await
            .unwrap();

        assert!(!consume_code(&pool, "a@b.co", "123456", OtpPurpose::EmailVerification).await.unwrap());
        assert!(consume_code(&pool, "a@b.co", "123456", OtpPurpose::PasswordReset).await.unwrap());
    }

    #[tokio::test]
    async fn new_code_replaces_old_one() {
        let pool = setup_test_db().await;
        replace_code(&pool, "a@b.co", "111111", OtpPurpose::EmailVerification, 5)
            .await
            .unwrap();
        replace_code(&pool, "a@b.co", "222222", OtpPurpose::EmailVerification, 5)
            .await
            .unwrap();

        assert!(!consume_code(&pool, "a@b.co", "111111", OtpPurpose::EmailVerification).await.unwrap());
        assert!(consume_code(&pool, "a@b.co", "222222", OtpPurpose::EmailVerification).await.unwrap());
    }

    #[tokio::test]
    async fn expired_codes_are_rejected_and_cleaned_up() {
        let pool = setup_test_db().await;
        replace_code(&pool, "a@b.co", "123456", OtpPurpose::EmailVerification, -1)
            .await
            .unwrap();

        assert!(!consume_code(&pool, "a@b.co", "123456", OtpPurpose::EmailVerification).await.unwrap());
        assert_eq!(cleanup_expired_codes(&pool).await.unwrap(), 1);
    }
}
