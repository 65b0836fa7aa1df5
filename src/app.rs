use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
};
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::AppConfig,
    database,
    error::{AppError, Result},
    queries::otp_queries,
    routes,
    services::email_service::{Mailer, SmtpMailer},
};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub mailer: Arc<dyn Mailer>,
    pub config: Arc<AppConfig>,
}

pub async fn build(config: &AppConfig) -> Result<Router> {
    let pool = database::create_pool(&config.database).await?;

    if config.database.seed_sample_data {
        let summary = database::seed::seed_sample_data(&pool, config.auth.bcrypt_cost).await?;
        tracing::info!(
            "Seeded {} users and {} products",
            summary.users_inserted,
            summary.products_inserted
        );
    }

    let expired = otp_queries::cleanup_expired_codes(&pool).await?;
    if expired > 0 {
        tracing::info!("Removed {} expired one-time codes", expired);
    }

    let mailer = SmtpMailer::from_config(&config.smtp)?;

    let state = AppState {
        db: pool,
        mailer: Arc::new(mailer),
        config: Arc::new(config.clone()),
    };

    router(state)
}

pub fn router(state: AppState) -> Result<Router> {
    let config = state.config.clone();

    let allowed_origins: Vec<HeaderValue> = config
        .cors
        .allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|_| AppError::ConfigError(format!("Invalid CORS origin: {}", origin)))
        })
        .collect::<Result<Vec<_>>>()?;

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION])
        .allow_origin(allowed_origins);

    if config.diagnostics_enabled {
        tracing::warn!("Diagnostic pages are enabled at /diagnostics");
    }

    let app = routes::create_router(state.clone())
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}
