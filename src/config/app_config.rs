use crate::error::{AppError, Result};
use std::{env, str::FromStr};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub auth: AuthConfig,
    pub smtp: SmtpConfig,
    pub verification: VerificationConfig,
    pub diagnostics_enabled: bool,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_size: usize,
    pub public_url: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub seed_sample_data: bool,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone)]
pub struct VerificationConfig {
    pub otp_ttl_minutes: i64,
    pub token_ttl_hours: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpEncryption {
    /// Plain connection upgraded with STARTTLS, usually port 587.
    StartTls,
    /// Implicit TLS from the first byte, usually port 465.
    Tls,
    /// No encryption. Only for local relays.
    None,
}

impl SmtpEncryption {
    pub fn default_port(self) -> u16 {
        match self {
            SmtpEncryption::StartTls => 587,
            SmtpEncryption::Tls => 465,
            SmtpEncryption::None => 25,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SmtpEncryption::StartTls => "starttls",
            SmtpEncryption::Tls => "tls",
            SmtpEncryption::None => "none",
        }
    }
}

impl FromStr for SmtpEncryption {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "starttls" | "tls-starttls" => Ok(SmtpEncryption::StartTls),
            "tls" | "ssl" | "smtps" => Ok(SmtpEncryption::Tls),
            "none" | "plain" => Ok(SmtpEncryption::None),
            other => Err(AppError::ConfigError(format!(
                "Invalid SMTP_ENCRYPTION value: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub encryption: SmtpEncryption,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
    pub timeout_secs: u64,
    pub debug: bool,
}

impl SmtpConfig {
    pub fn masked_password(&self) -> String {
        if self.password.is_empty() {
            "(not set)".to_string()
        } else {
            "*".repeat(self.password.chars().count().min(16))
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: &str) -> Result<T> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| AppError::ConfigError(format!("Invalid {} value", name)))
}

fn parse_flag(name: &str) -> Result<bool> {
    match env::var(name) {
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => Err(AppError::ConfigError(format!("Invalid {} value", name))),
        },
        Err(_) => Ok(false),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let port: u16 = parse_var("PORT", "3000")?;

        let encryption: SmtpEncryption = env::var("SMTP_ENCRYPTION")
            .unwrap_or_else(|_| "starttls".to_string())
            .parse()?;
        let smtp_username = env::var("SMTP_USERNAME").unwrap_or_default();

        Ok(Self {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port,
                max_body_size: parse_var("MAX_BODY_SIZE", "10485760")?,
                public_url: env::var("PUBLIC_URL")
                    .unwrap_or_else(|_| format!("http://localhost:{}", port))
                    .trim_end_matches('/')
                    .to_string(),
            },
            database: DatabaseConfig {
                url: env::var("DB_URL")?,
                max_connections: parse_var("DB_MAX_CONNECTIONS", "5")?,
                seed_sample_data: parse_flag("SEED_SAMPLE_DATA")?,
            },
            cors: CorsConfig {
                allowed_origins: env::var("FRONTEND_URL")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            auth: AuthConfig {
                jwt_secret: env::var("JWT_SECRET")
                    .map_err(|_| AppError::ConfigError("JWT_SECRET not set".to_string()))?,
                bcrypt_cost: parse_var("BCRYPT_COST", &bcrypt::DEFAULT_COST.to_string())?,
            },
            smtp: SmtpConfig {
                host: env::var("SMTP_HOST")
                    .map_err(|_| AppError::ConfigError("SMTP_HOST not set".to_string()))?,
                port: parse_var("SMTP_PORT", &encryption.default_port().to_string())?,
                encryption,
                password: env::var("SMTP_PASSWORD").unwrap_or_default(),
                from_email: env::var("SMTP_FROM_EMAIL").unwrap_or_else(|_| smtp_username.clone()),
                username: smtp_username,
                from_name: env::var("SMTP_FROM_NAME").unwrap_or_else(|_| "AgriMarket".to_string()),
                timeout_secs: parse_var("SMTP_TIMEOUT_SECS", "30")?,
                debug: parse_flag("SMTP_DEBUG")?,
            },
            verification: VerificationConfig {
                otp_ttl_minutes: parse_var("OTP_TTL_MINUTES", "5")?,
                token_ttl_hours: parse_var("VERIFICATION_TOKEN_TTL_HOURS", "24")?,
            },
            diagnostics_enabled: parse_flag("DIAGNOSTICS_ENABLED")?,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn verification_link(&self, token: &str) -> String {
        format!("{}/verify?token={}", self.server.public_url, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encryption_modes_parse_with_aliases() {
        assert_eq!("STARTTLS".parse::<SmtpEncryption>().unwrap(), SmtpEncryption::StartTls);
        assert_eq!("ssl".parse::<SmtpEncryption>().unwrap(), SmtpEncryption::Tls);
        assert_eq!("none".parse::<SmtpEncryption>().unwrap(), SmtpEncryption::None);
        assert!("carrier-pigeon".parse::<SmtpEncryption>().is_err());
    }

    #[test]
    fn encryption_default_ports() {
        assert_eq!(SmtpEncryption::StartTls.default_port(), 587);
        assert_eq!(SmtpEncryption::Tls.default_port(), 465);
    }

    #[test]
    fn password_is_masked() {
        let mut smtp = crate::test_utils::test_config().smtp;
        smtp.password = "app-password".to_string();
        assert_eq!(smtp.masked_password(), "************");
        smtp.password.clear();
        assert_eq!(smtp.masked_password(), "(not set)");
    }

    #[test]
    fn verification_link_uses_public_url() {
        let config = crate::test_utils::test_config();
        assert_eq!(
            config.verification_link("abc123"),
            "http://agrimarket.test/verify?token=abc123"
        );
    }
}
