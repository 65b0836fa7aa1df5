#![allow(dead_code)]
use std::{
    path::PathBuf,
    str::FromStr,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::{
    AppState,
    config::{
        AppConfig, AuthConfig, CorsConfig, DatabaseConfig, ServerConfig, SmtpConfig,
        SmtpEncryption, VerificationConfig,
    },
    database::{self, schema},
    models::{Product, User, UserType},
    queries::{
        product_queries::{self, NewProduct},
        user_queries::{self, NewUser},
    },
    services::email_service::{DeliveryReport, Mailer, OutgoingEmail},
};

pub(crate) fn test_config() -> AppConfig {
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
            jwt_secret: "test-secret".to_string(),
            bcrypt_cost: 4,
        },
        smtp: SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            encryption: SmtpEncryption::StartTls,
            username: "mailer@example.com".to_string(),
            password: String::new(),
            from_email: "mailer@example.com".to_string(),
            from_name: "AgriMarket".to_string(),
            timeout_secs: 5,
            debug: true,
        },
        verification: VerificationConfig {
            otp_ttl_minutes: 5,
            token_ttl_hours: 24,
        },
        diagnostics_enabled: true,
    }
}

/// Single-connection in-memory pool without any schema.
pub(crate) async fn raw_memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("valid sqlite url")
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None::<Duration>)
        .max_lifetime(None::<Duration>)
        .connect_with(options)
        .await
        .expect("in-memory sqlite pool")
}

pub(crate) async fn setup_test_db() -> SqlitePool {
    let pool = raw_memory_pool().await;
    schema::bootstrap(&pool).await.expect("schema bootstrap");
    pool
}

/// On-disk database shared by several pooled connections. Files are removed on drop.
pub(crate) struct FileTestDb {
    pub(crate) pool: SqlitePool,
    path: PathBuf,
}

impl Drop for FileTestDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", self.path.display(), suffix));
        }
    }
}

pub(crate) async fn file_test_db(max_connections: u32) -> FileTestDb {
    let path = std::env::temp_dir().join(format!(
        "agrimarket-test-{}.db",
        uuid::Uuid::new_v4().simple()
    ));
    let config = DatabaseConfig {
        url: format!("sqlite://{}", path.display()),
        max_connections,
        seed_sample_data: false,
    };

    let pool = database::create_pool(&config)
        .await
        .expect("file-backed sqlite pool");

    FileTestDb { pool, path }
}

pub(crate) async fn insert_user(pool: &SqlitePool, email: &str, user_type: UserType) -> User {
    user_queries::create_user(
        pool,
        &NewUser {
            full_name: "Test User",
            email,
            password_hash: "not-a-real-hash",
            user_type,
            verification_token: None,
            verification_expires_at: None,
        },
    )
    .await
    .expect("insert user")
}

pub(crate) async fn insert_product(
    pool: &SqlitePool,
    farmer_id: i64,
    name: &str,
    price: f64,
    stock: i64,
) -> Product {
    product_queries::create_product(
        pool,
        &NewProduct {
            farmer_id,
            name,
            description: None,
            price,
            image_url: None,
            stock,
        },
    )
    .await
    .expect("insert product")
}

#[derive(Default)]
pub(crate) struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    fail: bool,
}

impl RecordingMailer {
    pub(crate) fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub(crate) fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> DeliveryReport {
        if self.fail {
            return DeliveryReport::failure(
                "Failed to send email: connection refused",
                vec!["Error: connection refused".to_string()],
            );
        }
        self.sent.lock().unwrap().push(email.clone());
        DeliveryReport::success("Email sent successfully", vec!["250 OK".to_string()])
    }

    async fn test_connection(&self) -> DeliveryReport {
        if self.fail {
            DeliveryReport::failure("SMTP connection failed: refused", Vec::new())
        } else {
            DeliveryReport::success("SMTP connection succeeded", Vec::new())
        }
    }
}

pub(crate) async fn test_state(mailer: Arc<RecordingMailer>) -> AppState {
    AppState {
        db: setup_test_db().await,
        mailer,
        config: Arc::new(test_config()),
    }
}
