use async_trait::async_trait;
use lettre::{
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart},
};

use crate::{
    config::{SmtpConfig, load_smtp_transport},
    error::{AppError, Result},
    models::OtpPurpose,
    utils::html,
};

const OTP_TEMPLATE: &str = include_str!("../templates/otp_email.html");
const VERIFICATION_TEMPLATE: &str = include_str!("../templates/verification_email.html");

#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to_address: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

/// Outcome of one delivery attempt, kept for API responses and diagnostic pages.
#[derive(Debug, Clone)]
pub struct DeliveryReport {
    pub success: bool,
    pub message: String,
    pub transcript: Vec<String>,
}

impl DeliveryReport {
    pub fn success(message: impl Into<String>, transcript: Vec<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            transcript,
        }
    }

    pub fn failure(message: impl Into<String>, transcript: Vec<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            transcript,
        }
    }

    pub fn into_result(self) -> Result<DeliveryReport> {
        if self.success {
            Ok(self)
        } else {
            Err(AppError::MailError(self.message))
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> DeliveryReport;

    async fn test_connection(&self) -> DeliveryReport;
}

struct Transcript {
    enabled: bool,
    lines: Vec<String>,
}

impl Transcript {
    fn new(enabled: bool) -> Self {
        Self {
            enabled,
            lines: Vec::new(),
        }
    }

    fn push(&mut self, line: impl Into<String>) {
        if self.enabled {
            self.lines.push(line.into());
        }
    }
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    endpoint: String,
    username: String,
    debug: bool,
}

impl SmtpMailer {
    pub fn from_config(config: &SmtpConfig) -> Result<Self> {
        let from_address: Address = config.from_email.parse().map_err(|e| {
            AppError::ConfigError(format!(
                "Invalid SMTP_FROM_EMAIL {:?}: {}",
                config.from_email, e
            ))
        })?;

        Ok(Self {
            transport: load_smtp_transport(config)?,
            from: Mailbox::new(Some(config.from_name.clone()), from_address),
            endpoint: format!(
                "{}:{} ({})",
                config.host,
                config.port,
                config.encryption.as_str()
            ),
            username: config.username.clone(),
            debug: config.debug,
        })
    }

    fn build_message(&self, email: &OutgoingEmail) -> Result<Message> {
        let address: Address = email.to_address.parse().map_err(|e| {
            AppError::MailError(format!(
                "Invalid recipient address {}: {}",
                email.to_address, e
            ))
        })?;

        Message::builder()
            .from(self.from.clone())
            .to(Mailbox::new(email.to_name.clone(), address))
            .subject(email.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                email.text_body.clone(),
                email.html_body.clone(),
            ))
            .map_err(|e| AppError::MailError(format!("Failed to build message: {}", e)))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> DeliveryReport {
        let mut transcript = Transcript::new(self.debug);
        transcript.push(format!("Connecting to {}", self.endpoint));
        if !self.username.is_empty() {
            transcript.push(format!("Authenticating as {}", self.username));
        }

        let message = match self.build_message(email) {
            Ok(message) => message,
            Err(e) => {
                transcript.push(e.to_string());
                return DeliveryReport::failure(e.public_message(), transcript.lines);
            }
        };

        transcript.push(format!("MAIL FROM: {}", self.from.email));
        transcript.push(format!("RCPT TO: {}", email.to_address));

        match self.transport.send(message).await {
            Ok(response) => {
                let reply = response.message().collect::<Vec<_>>().join(" ");
                transcript.push(format!("{} {}", response.code(), reply));
                tracing::info!("Email \"{}\" accepted for delivery", email.subject);
                DeliveryReport::success("Email sent successfully", transcript.lines)
            }
            Err(e) => {
                tracing::error!("Failed to send email via {}: {:?}", self.endpoint, e);
                transcript.push(format!("Error: {}", e));
                DeliveryReport::failure(format!("Failed to send email: {}", e), transcript.lines)
            }
        }
    }

    async fn test_connection(&self) -> DeliveryReport {
        // Connection tests always carry their transcript.
        let mut transcript = Transcript::new(true);
        transcript.push(format!("Connecting to {}", self.endpoint));

        match self.transport.test_connection().await {
            Ok(true) => {
                transcript.push("Server accepted the connection");
                DeliveryReport::success("SMTP connection succeeded", transcript.lines)
            }
            Ok(false) => {
                transcript.push("Server did not respond to NOOP");
                DeliveryReport::failure("SMTP server is not responding", transcript.lines)
            }
            Err(e) => {
                tracing::warn!("SMTP connection test failed: {:?}", e);
                transcript.push(format!("Error: {}", e));
                DeliveryReport::failure(format!("SMTP connection failed: {}", e), transcript.lines)
            }
        }
    }
}

fn display_name(name: Option<&str>, email: &str) -> String {
    name.map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| email.split('@').next().unwrap_or(email).to_string())
}

pub fn otp_email(
    recipient: &str,
    name: Option<&str>,
    code: &str,
    purpose: OtpPurpose,
    ttl_minutes: i64,
) -> OutgoingEmail {
    let name = display_name(name, recipient);

    let html_body = OTP_TEMPLATE
        .replace("{{name}}", &html::escape(&name))
        .replace("{{action}}", purpose.action())
        .replace("{{code}}", code)
        .replace("{{minutes}}", &ttl_minutes.to_string());

    let text_body = format!(
        "Hello {},\n\nUse the code {} to {}. It expires in {} minutes.\n\nAgriMarket",
        name,
        code,
        purpose.action(),
        ttl_minutes
    );

    OutgoingEmail {
        to_address: recipient.to_string(),
        to_name: Some(name),
        subject: purpose.subject().to_string(),
        html_body,
        text_body,
    }
}

pub fn verification_email(
    recipient: &str,
    name: Option<&str>,
    link: &str,
    ttl_hours: i64,
) -> OutgoingEmail {
    let name = display_name(name, recipient);

    let html_body = VERIFICATION_TEMPLATE
        .replace("{{name}}", &html::escape(&name))
        .replace("{{link}}", &html::escape(link))
        .replace("{{hours}}", &ttl_hours.to_string());

    let text_body = format!(
        "Hello {},\n\nConfirm your email address by opening this link:\n{}\n\nThe link expires in {} hours.\n\nAgriMarket",
        name, link, ttl_hours
    );

    OutgoingEmail {
        to_address: recipient.to_string(),
        to_name: Some(name),
        subject: "Verify your AgriMarket email address".to_string(),
        html_body,
        text_body,
    }
}

pub async fn send_otp_email(
    mailer: &dyn Mailer,
    recipient: &str,
    name: Option<&str>,
    code: &str,
    purpose: OtpPurpose,
    ttl_minutes: i64,
) -> Result<DeliveryReport> {
    let email = otp_email(recipient, name, code, purpose, ttl_minutes);
    mailer.send(&email).await.into_result()
}

pub async fn send_verification_email(
    mailer: &dyn Mailer,
    recipient: &str,
    name: Option<&str>,
    link: &str,
    ttl_hours: i64,
) -> Result<DeliveryReport> {
    let email = verification_email(recipient, name, link, ttl_hours);
    mailer.send(&email).await.into_result()
}
