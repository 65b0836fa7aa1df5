#![allow(dead_code)]
use std::sync::{Arc, Mutex};

use agrimarket::{
    AppState,
    app,
    config::{
        AppConfig, AuthConfig, CorsConfig, DatabaseConfig, ServerConfig, SmtpConfig,
        SmtpEncryption, VerificationConfig,
    },
    database,
    services::email_service::{DeliveryReport, Mailer, OutgoingEmail},
};
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_to(&self, address: &str) -> OutgoingEmail {
        self.sent()
            .into_iter()
            .rev()
            .find(|email| email.to_address == address)
            .unwrap_or_else(|| panic!("no email sent to {}", address))
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> DeliveryReport {
        self.sent.lock().unwrap().push(email.clone());
        DeliveryReport::success("Email sent successfully", vec!["250 OK".to_string()])
    }

    async fn test_connection(&self) -> DeliveryReport {
        DeliveryReport::success("SMTP connection succeeded", Vec::new())
    }
}

pub fn config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            max_body_size: 1024 * 1024,
            public_url: "http://agrimarket.test".to_string(),
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            seed_sample_data: false,
        },
        cors: CorsConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
        auth: AuthConfig {
            jwt_secret: "integration-secret".to_string(),
            bcrypt_cost: 4,
        },
        smtp: SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            encryption: SmtpEncryption::StartTls,
            username: "mailer@example.com".to_string(),
            password: "app-password".to_string(),
            from_email: "mailer@example.com".to_string(),
            from_name: "AgriMarket".to_string(),
            timeout_secs: 5,
            debug: true,
        },
        verification: VerificationConfig {
            otp_ttl_minutes: 5,
            token_ttl_hours: 24,
        },
        diagnostics_enabled: false,
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::with_config(config()).await
    }

    pub async fn with_config(config: AppConfig) -> Self {
        let db = database::create_pool(&config.database)
            .await
            .expect("in-memory database");
        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState {
            db,
            mailer: mailer.clone(),
            config: Arc::new(config),
        };
        let router = app::router(state.clone()).expect("router");

        Self {
            router,
            state,
            mailer,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, String) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, text) = self.request(method, uri, token, body).await;
        let value = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or_else(|_| panic!("not json: {}", text))
        };
        (status, value)
    }

    /// Registers, verifies through the emailed link, and logs in. Returns the JWT.
    pub async fn verified_user(&self, email: &str, user_type: &str) -> String {
        let (status, _) = self
            .json(
                Method::POST,
                "/auth/register",
                None,
                Some(serde_json::json!({
                    "full_name": "Test Person",
                    "email": email,
                    "password": "password123",
                    "user_type": user_type,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let token = verification_token(&self.mailer.last_to(email));
        let (status, _) = self
            .request(Method::GET, &format!("/verify?token={}", token), None, None)
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = self
            .json(
                Method::POST,
                "/auth/login",
                None,
                Some(serde_json::json!({ "email": email, "password": "password123" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }
}

pub fn verification_token(email: &OutgoingEmail) -> String {
    email
        .text_body
        .split("token=")
        .nth(1)
        .and_then(|rest| rest.split_whitespace().next())
        .expect("verification link in email")
        .to_string()
}

pub fn otp_code(email: &OutgoingEmail) -> String {
    email
        .text_body
        .split_whitespace()
        .find(|word| word.len() == 6 && word.bytes().all(|b| b.is_ascii_digit()))
        .expect("code in email")
        .to_string()
}
