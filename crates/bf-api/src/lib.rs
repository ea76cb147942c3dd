//! # bf-api
//!
//! The web routing and orchestration layer for birdfeed.

pub mod error;
pub mod handlers;
pub mod middleware;

use actix_web::web;
use bf_core::error::AppError;

use crate::error::ApiError;

/// Configures the routes for the API.
///
/// # Developer Note
/// We use a scoped configuration to allow the main binary to mount
/// the API under different paths if needed (e.g., /api/v1/).
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        ApiError(AppError::ValidationError(err.to_string())).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        ApiError(AppError::ValidationError(err.to_string())).into()
    }))
    .service(
        web::scope("")
            .route("/", web::get().to(handlers::index))
            // Accounts
            .route("/signup", web::post().to(handlers::signup))
            .route("/login", web::post().to(handlers::login))
            .route("/profile", web::get().to(handlers::profile))
            .route("/search", web::get().to(handlers::search))
            // Social graph
            .route("/follow", web::post().to(handlers::follow))
            .route("/unfollow", web::post().to(handlers::unfollow))
            // Posting and reading
            .route("/tweet", web::post().to(handlers::tweet))
            .route("/feed", web::get().to(handlers::feed)),
    );
}
