//! birdfeed/crates/bf-api/src/middleware.rs Middleware
//!
//! Custom middleware for security, logging, and cross-origin access.

use actix_cors::Cors;
use actix_web::http::header::{self, HeaderName};
use actix_web::middleware::{DefaultHeaders, Logger};

/// Header older web clients use to carry their token.
pub const LEGACY_TOKEN_HEADER: HeaderName = HeaderName::from_static("token");

// Returns a standard set of middleware for the birdfeed API.
pub fn standard_middleware() -> Logger {
    // remote-ip "request-line" status-code response-size "referrer" "user-agent"
    Logger::default()
}

// Configures CORS (Cross-Origin Resource Sharing)
// The web client is served from a different origin than the API.
pub fn cors_policy() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            LEGACY_TOKEN_HEADER,
        ])
        .max_age(3600)
}

// Security headers attached to every response.
pub fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .add((header::REFERRER_POLICY, "strict-origin-when-cross-origin"))
}
