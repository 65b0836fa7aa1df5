use crate::{
    error::{AppError, Result},
    utils::jwt::Claims,
};

pub fn extract_user_id(claims: &Claims) -> Result<i64> {
    claims
        .sub
        .parse::<i64>()
        .map_err(|_| AppError::Unauthorized("Unauthorized".to_string()))
}

pub fn validate_email(email: &str) -> Result<()> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if !valid {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }
    Ok(())
}

/// Lowercased, trimmed form used as the lookup key for accounts and codes.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(validate_email("john@example.com").is_ok());
        assert!(validate_email("john@localhost").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("john example@x.com").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_email("  John@Example.COM "), "john@example.com");
    }
}
