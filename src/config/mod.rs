mod app_config;
mod smtp_config;

pub use app_config::{
    AppConfig, AuthConfig, CorsConfig, DatabaseConfig, ServerConfig, SmtpConfig, SmtpEncryption,
    VerificationConfig,
};
pub use smtp_config::*;
