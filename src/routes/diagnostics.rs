//! Operator pages for checking the database and mail setup from a browser.

use axum::{
    Router,
    extract::{Query, State},
    response::Html,
    routing::get,
};

use crate::{
    AppState,
    database::{self, schema},
    models::{OtpDiagnosticQuery, OtpPurpose},
    services::email_service,
    utils::{codes, extractors::validate_email, html},
};

const OTP_FORM: &str = "<form method=\"get\" action=\"/diagnostics/otp\">\
    <label>Recipient <input type=\"email\" name=\"email\" required></label> \
    <button type=\"submit\">Send test code</button></form>";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/database", get(database_check))
        .route("/smtp", get(smtp_check))
        .route("/otp", get(otp_check))
}

pub async fn database_check(State(state): State<AppState>) -> Html<String> {
    let mut body = String::new();

    if let Err(e) = database::check_health(&state.db).await {
        body.push_str(&html::status_line(false, &format!("Database connection failed: {}", e)));
        return Html(html::render_page("Database connection test", &body));
    }
    body.push_str(&html::status_line(true, "Database connection successful"));

    match schema::table_counts(&state.db).await {
        Ok(counts) => {
            let rows: Vec<(&str, String)> = counts
                .into_iter()
                .map(|(table, count)| (table, format!("{} rows", count)))
                .collect();
            body.push_str("<h2>Tables</h2>");
            body.push_str(&html::key_value_table(&rows));
        }
        Err(e) => body.push_str(&html::status_line(false, &format!("Could not count rows: {}", e))),
    }

    match schema::has_column(&state.db, "products", "stock").await {
        Ok(true) => body.push_str(&html::status_line(true, "products.stock column present")),
        Ok(false) => body.push_str(&html::status_line(false, "products.stock column missing")),
        Err(e) => body.push_str(&html::status_line(false, &format!("Column check failed: {}", e))),
    }

    Html(html::render_page("Database connection test", &body))
}

pub async fn smtp_check(State(state): State<AppState>) -> Html<String> {
    let smtp = &state.config.smtp;

    let mut body = String::from("<h2>Configuration</h2>");
    body.push_str(&html::key_value_table(&[
        ("Host", smtp.host.clone()),
        ("Port", smtp.port.to_string()),
        ("Encryption", smtp.encryption.as_str().to_string()),
        ("Username", smtp.username.clone()),
        ("Password", smtp.masked_password()),
        ("From", format!("{} <{}>", smtp.from_name, smtp.from_email)),
        ("Timeout", format!("{} s", smtp.timeout_secs)),
        ("Debug transcript", smtp.debug.to_string()),
    ]));

    let report = state.mailer.test_connection().await;
    body.push_str(&html::status_line(report.success, &report.message));
    body.push_str(&html::transcript_block(&report.transcript));

    Html(html::render_page("SMTP connection test", &body))
}

pub async fn otp_check(
    State(state): State<AppState>,
    Query(params): Query<OtpDiagnosticQuery>,
) -> Html<String> {
    let email = match params.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        Some(email) => email.to_string(),
        None => return Html(html::render_page("OTP email test", OTP_FORM)),
    };

    let mut body = String::new();

    if let Err(e) = validate_email(&email) {
        body.push_str(&html::status_line(false, e.public_message()));
        body.push_str(OTP_FORM);
        return Html(html::render_page("OTP email test", &body));
    }

    // Test codes are shown on the page and never stored.
    let code = codes::generate_otp();
    let message = email_service::otp_email(
        &email,
        None,
        &code,
        OtpPurpose::EmailVerification,
        state.config.verification.otp_ttl_minutes,
    );
    let report = state.mailer.send(&message).await;

    body.push_str(&html::key_value_table(&[
        ("Recipient", email),
        ("Generated code", code),
    ]));
    body.push_str(&html::status_line(report.success, &report.message));
    body.push_str(&html::transcript_block(&report.transcript));
    body.push_str(OTP_FORM);

    Html(html::render_page("OTP email test", &body))
}
