use sqlx::SqlitePool;

use crate::{
    error::{AppError, Result},
    models::{User, UserType},
};

pub struct NewUser<'a> {
    pub full_name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub user_type: UserType,
    pub verification_token: Option<&'a str>,
    pub verification_expires_at: Option<i64>,
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

pub async fn create_user(pool: &SqlitePool, new_user: &NewUser<'_>) -> Result<User> {
    sqlx::query_as::<_, User>(
        "INSERT INTO users
            (full_name, email, password_hash, user_type, verification_token, verification_expires_at)
         VALUES (?, ?, ?, ?, ?, ?)
         RETURNING *",
    )
    .bind(new_user.full_name)
    .bind(new_user.email)
    .bind(new_user.password_hash)
    .bind(new_user.user_type)
    .bind(new_user.verification_token)
    .bind(new_user.verification_expires_at)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("Email already registered".to_string())
        } else {
            AppError::DatabaseError(e)
        }
    })
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn set_verification_token(
    pool: &SqlitePool,
    user_id: i64,
    token: &str,
    expires_at: i64,
) -> Result<()> {
    sqlx::query(
        "UPDATE users SET verification_token = ?, verification_expires_at = ?
         WHERE id = ? AND is_verified = 0",
    )
    .bind(token)
    .bind(expires_at)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Consumes a verification token. Check and update happen in one statement,
/// so a token can only ever verify one request.
pub async fn verify_by_token(pool: &SqlitePool, token: &str, now: i64) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "UPDATE users
         SET is_verified = 1, verification_token = NULL, verification_expires_at = NULL
         WHERE verification_token = ?
           AND is_verified = 0
           AND (verification_expires_at IS NULL OR verification_expires_at > ?)
         RETURNING *",
    )
    .bind(token)
    .bind(now)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn mark_verified_by_email(pool: &SqlitePool, email: &str) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE users
         SET is_verified = 1, verification_token = NULL, verification_expires_at = NULL
         WHERE email = ? AND is_verified = 0",
    )
    .bind(email)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn update_password(pool: &SqlitePool, email: &str, password_hash: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE users SET password_hash = ? WHERE email = ?")
        .bind(password_hash)
        .bind(email)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete_user(pool: &SqlitePool, id: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
