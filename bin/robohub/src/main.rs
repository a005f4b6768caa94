//! # RoboHub Binary
//!
//! The entry point that assembles the application based on compile-time features.

use std::sync::Arc;

use anyhow::Context;
use rh_api::{create_router, ApiPolicy, AppState, MiddlewareConfig};
use rh_config::Config;
use tracing::info;
use tracing_subscriber::EnvFilter;

// Feature-gated imports: each port is filled by exactly one plugin.
#[cfg(feature = "db-sqlite")]
use rh_db_sqlite::SqliteContentRepo;

#[cfg(feature = "storage-placeholder")]
use rh_storage_placeholder::PlaceholderMediaStore;

#[cfg(feature = "auth-jwt")]
use rh_auth_jwt::JwtSessionProvider;

#[cfg(not(feature = "db-sqlite"))]
compile_error!("no ContentRepo plugin selected; enable the `db-sqlite` feature");

#[cfg(not(feature = "storage-placeholder"))]
compile_error!("no MediaStore plugin selected; enable the `storage-placeholder` feature");

#[cfg(not(feature = "auth-jwt"))]
compile_error!("no SessionProvider plugin selected; enable the `auth-jwt` feature");

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    // Missing identity-provider credentials stop the process here.
    let config = Config::from_env().context("invalid configuration")?;

    // 1. Initialize Database Implementation
    let repo = SqliteContentRepo::new(&config.database_url)
        .await
        .with_context(|| format!("failed to open database {}", config.database_url))?;

    // 2. Initialize Storage Implementation
    let store = PlaceholderMediaStore::new(
        config.placeholder_file_url.clone(),
        config.placeholder_thumbnail_url.clone(),
    );

    // 3. Initialize Session Implementation
    let sessions = JwtSessionProvider::new(&config.session_secret, config.session_ttl_secs);

    // 4. Wrap in AppState (dynamic dispatch keeps handlers plugin-agnostic)
    let state = Arc::new(AppState {
        repo: Box::new(repo),
        store: Box::new(store),
        sessions: Box::new(sessions),
        policy: ApiPolicy {
            enforce_article_ownership: config.enforce_article_ownership,
        },
    });

    let app = create_router(
        state,
        MiddlewareConfig {
            max_upload_bytes: config.max_upload_bytes,
            cors_allow_any_origin: config.cors_allow_any_origin,
        },
    );

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address))?;

    info!(
        address = %config.bind_address,
        github_client = %config.github.client_id,
        google_client = %config.google.client_id,
        enforce_article_ownership = config.enforce_article_ownership,
        "RoboHub starting"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
