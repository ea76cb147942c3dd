//! # birdfeed Binary
//!
//! The entry point that assembles the application based on compile-time features.

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use bf_api::handlers::AppState;
use bf_api::middleware::{cors_policy, security_headers, standard_middleware};
use bf_config::Settings;
use bf_core::service::SocialService;
use bf_core::traits::{AccountRepo, OrderingClock};
use secrecy::ExposeSecret;

// Feature-gated imports: plugins are compiled to order
#[cfg(feature = "db-sqlite")]
use bf_db_sqlite::{SqliteAccountRepo, SqliteClock};

#[cfg(all(feature = "db-memory", not(feature = "db-sqlite")))]
use bf_core::clock::AtomicClock;
#[cfg(all(feature = "db-memory", not(feature = "db-sqlite")))]
use bf_db_memory::MemoryAccountRepo;

#[cfg(feature = "auth-simple")]
use bf_auth_simple::SimpleAuthProvider;

#[cfg(not(any(feature = "db-sqlite", feature = "db-memory")))]
compile_error!("enable one of the `db-sqlite` or `db-memory` features");

#[cfg(not(feature = "auth-simple"))]
compile_error!("the `auth-simple` feature is required");

/// SQLite wins when both storage features are enabled.
#[cfg(feature = "db-sqlite")]
async fn storage(
    settings: &Settings,
) -> anyhow::Result<(Arc<dyn AccountRepo>, Arc<dyn OrderingClock>)> {
    let repo = SqliteAccountRepo::new(&settings.database.url).await?;
    let clock = SqliteClock::new(repo.pool());
    log::info!("using sqlite storage at {}", settings.database.url);
    Ok((Arc::new(repo), Arc::new(clock)))
}

#[cfg(all(feature = "db-memory", not(feature = "db-sqlite")))]
async fn storage(
    _settings: &Settings,
) -> anyhow::Result<(Arc<dyn AccountRepo>, Arc<dyn OrderingClock>)> {
    log::warn!("using in-memory storage; nothing will persist");
    Ok((Arc::new(MemoryAccountRepo::new()), Arc::new(AtomicClock::new())))
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::load()?;

    // 1. Initialize Storage Implementation
    let (repo, clock) = storage(&settings).await?;

    // 2. Initialize Auth Implementation
    let auth = SimpleAuthProvider::new(
        settings.auth.jwt_secret.expose_secret(),
        settings.auth.token_ttl_secs,
    );

    // 3. Wrap in AppState (dynamic dispatch keeps plugins swappable)
    let service = SocialService::new(repo, clock, Arc::new(auth), settings.clock.scope);
    let (host, port) = settings.bind_address();
    log::info!(
        "birdfeed starting on http://{host}:{port} (clock scope: {})",
        service.scope()
    );

    let state = web::Data::new(AppState {
        service,
        limits: settings.feed,
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(cors_policy())
            .wrap(security_headers())
            .wrap(standard_middleware())
            .configure(bf_api::configure_routes)
    })
    .bind((host, port))?
    .run()
    .await?;

    Ok(())
}
