use std::time::Duration;

use lettre::{
    AsyncSmtpTransport, Tokio1Executor, transport::smtp::authentication::Credentials,
};

use crate::{
    config::{SmtpConfig, SmtpEncryption},
    error::{AppError, Result},
};

pub fn load_smtp_transport(config: &SmtpConfig) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
    let builder = match config.encryption {
        SmtpEncryption::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host),
        SmtpEncryption::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host),
        SmtpEncryption::None => Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(
            &config.host,
        )),
    }
    .map_err(|e| AppError::ConfigError(format!("Invalid SMTP host {}: {}", config.host, e)))?;

    let mut builder = builder
        .port(config.port)
        .timeout(Some(Duration::from_secs(config.timeout_secs)));

    if !config.username.is_empty() {
        builder = builder.credentials(Credentials::new(
            config.username.clone(),
            config.password.clone(),
        ));
    }

    tracing::info!(
        "SMTP transport initialized for {}:{} ({})",
        config.host,
        config.port,
        config.encryption.as_str()
    );

    Ok(builder.build())
}
