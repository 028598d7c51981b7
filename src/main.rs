//! Taskgate - token-authenticated task manager API
//! Startup order: env, tracing, config, services, admin bootstrap, listener

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use std::net::SocketAddr;
use std::path::Path;
use taskgate_backend::{build_router, build_state, Config};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment and logging
    load_env();
    init_tracing();

    let config = Config::parse();
    config.validate()?;

    info!("🚀 Taskgate starting");
    if config.uses_dev_secret() {
        warn!("⚠️  SECRET_KEY not set, using the development secret");
    }

    let state = build_state(&config)?;
    info!(
        bcrypt_cost = config.bcrypt_cost,
        hash_workers = config.hash_worker_count(),
        token_ttl_hours = config.token_ttl_hours,
        "🔐 Authentication initialized"
    );

    // Exactly once, before the listener accepts anything
    let store = state.store.clone();
    state
        .workers
        .run(move || store.bootstrap_admin())
        .await?
        .context("Failed to bootstrap admin account")?;

    let app = build_router(state);

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!("🎯 API server listening on {}", config.bind);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}

/// Initialize tracing with an env-driven filter
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskgate_backend=debug,taskgate=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    // 1) Standard dotenv search (cwd + parents)
    let _ = dotenv();

    // 2) Also try the crate's own .env when launched from elsewhere
    let manifest_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if manifest_env.exists() {
        let _ = dotenv::from_path(&manifest_env);
    }
}
