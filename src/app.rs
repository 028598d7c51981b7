//! Router assembly
//!
//! Public routes, token-gated routes and admin-gated routes, each group
//! composed with its own access gate.

use crate::{
    auth::{
        api as auth_api, auth_middleware, models::UserRole, AccessGate, AuthState,
        CredentialStore, HashWorkers, PasswordHasher, TokenService,
    },
    config::Config,
    middleware::request_logging,
};
use anyhow::{Context, Result};
use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Construct the auth services described by `config`. Does not bootstrap the admin.
pub fn build_state(config: &Config) -> Result<AuthState> {
    let hasher = PasswordHasher::new(config.bcrypt_cost).context("Invalid bcrypt cost")?;
    let store = CredentialStore::new(hasher).context("Failed to initialise credential store")?;
    let tokens = TokenService::with_ttl(&config.secret_key, config.token_ttl()?);

    Ok(AuthState::new(
        Arc::new(store),
        Arc::new(tokens),
        HashWorkers::new(config.hash_worker_count()),
    ))
}

pub fn build_router(state: AuthState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/register", post(auth_api::register))
        .route("/api/auth/login", post(auth_api::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/api/auth/me", get(auth_api::get_current_user))
        .route("/api/users/:id", get(auth_api::get_user))
        .route_layer(middleware::from_fn_with_state(
            AccessGate::authenticated(state.tokens.clone()),
            auth_middleware,
        ))
        .with_state(state.clone());

    let admin_routes = Router::new()
        .route("/api/admin/users", get(auth_api::list_users))
        .route_layer(middleware::from_fn_with_state(
            AccessGate::require(state.tokens.clone(), UserRole::Admin),
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .layer(middleware::from_fn(request_logging))
        .layer(CorsLayer::permissive())
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "taskgate-backend",
    }))
}
