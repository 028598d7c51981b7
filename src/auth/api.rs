//! Authentication API Endpoints
//! Mission: Provide register, login and user lookup endpoints

use crate::auth::{
    credential_store::{CredentialStore, StoreError},
    jwt::TokenService,
    models::{missing_fields, Claims, LoginRequest, LoginResponse, RegisterRequest, UserResponse},
    password::{HashError, HashWorkers},
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub store: Arc<CredentialStore>,
    pub tokens: Arc<TokenService>,
    pub workers: HashWorkers,
}

impl AuthState {
    pub fn new(
        store: Arc<CredentialStore>,
        tokens: Arc<TokenService>,
        workers: HashWorkers,
    ) -> Self {
        Self {
            store,
            tokens,
            workers,
        }
    }
}

/// Register endpoint - POST /api/auth/register
pub async fn register(
    State(state): State<AuthState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), AuthApiError> {
    let Json(payload) = payload.map_err(|e| AuthApiError::Validation(e.body_text()))?;

    let missing = missing_fields(&[
        ("username", payload.username.as_deref()),
        ("email", payload.email.as_deref()),
        ("password", payload.password.as_deref()),
    ]);
    if !missing.is_empty() {
        return Err(AuthApiError::missing(&missing));
    }

    let (username, email, password) = (
        payload.username.unwrap_or_default(),
        payload.email.unwrap_or_default(),
        payload.password.unwrap_or_default(),
    );

    let store = state.store.clone();
    let user = state
        .workers
        .run(move || store.register(&username, &email, &password))
        .await??;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Login endpoint - POST /api/auth/login
pub async fn login(
    State(state): State<AuthState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AuthApiError> {
    let Json(payload) = payload.map_err(|e| AuthApiError::Validation(e.body_text()))?;

    let missing = missing_fields(&[
        ("username", payload.username.as_deref()),
        ("password", payload.password.as_deref()),
    ]);
    if !missing.is_empty() {
        return Err(AuthApiError::missing(&missing));
    }

    let username = payload.username.unwrap_or_default();
    let password = payload.password.unwrap_or_default();
    info!("🔐 Login attempt: {}", username);

    let store = state.store.clone();
    let attempted = username.clone();
    let user = match state
        .workers
        .run(move || store.authenticate(&attempted, &password))
        .await?
    {
        Ok(user) => user,
        Err(StoreError::InvalidCredential) => {
            warn!("❌ Failed login attempt: {}", username);
            return Err(AuthApiError::InvalidCredentials);
        }
        Err(e) => return Err(e.into()),
    };

    let (token, expires_in) = state.tokens.issue(&user).map_err(|e| {
        error!("Failed to issue token: {}", e);
        AuthApiError::Internal
    })?;

    info!("✅ Login successful: {} ({})", user.username, user.role);

    Ok(Json(LoginResponse {
        token,
        expires_in,
        user,
    }))
}

/// Current caller - GET /api/auth/me
/// Answered from the token alone, so the role is whatever the token carries.
pub async fn get_current_user(Extension(claims): Extension<Claims>) -> Json<Claims> {
    Json(claims)
}

/// Single user - GET /api/users/:id
pub async fn get_user(
    State(state): State<AuthState>,
    Path(user_id): Path<u64>,
) -> Result<Json<UserResponse>, AuthApiError> {
    state
        .store
        .get_by_id(user_id)
        .map(Json)
        .ok_or(AuthApiError::UserNotFound)
}

/// List all users - GET /api/admin/users (Admin only, enforced by the route's gate)
pub async fn list_users(State(state): State<AuthState>) -> Json<Vec<UserResponse>> {
    Json(state.store.list())
}

/// Auth API errors
#[derive(Debug)]
pub enum AuthApiError {
    Validation(String),
    UsernameTaken,
    EmailTaken,
    InvalidCredentials,
    UserNotFound,
    Internal,
}

impl AuthApiError {
    fn missing(fields: &[&str]) -> Self {
        AuthApiError::Validation(format!("Missing required fields: {}", fields.join(", ")))
    }
}

impl From<StoreError> for AuthApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UsernameTaken => AuthApiError::UsernameTaken,
            StoreError::EmailTaken => AuthApiError::EmailTaken,
            StoreError::InvalidCredential => AuthApiError::InvalidCredentials,
            StoreError::Hashing(e) => e.into(),
        }
    }
}

impl From<HashError> for AuthApiError {
    fn from(err: HashError) -> Self {
        error!("Password hashing failed: {}", err);
        AuthApiError::Internal
    }
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthApiError::Validation(message) => (StatusCode::BAD_REQUEST, message),
            AuthApiError::UsernameTaken => {
                (StatusCode::CONFLICT, StoreError::UsernameTaken.to_string())
            }
            AuthApiError::EmailTaken => (StatusCode::CONFLICT, StoreError::EmailTaken.to_string()),
            AuthApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                StoreError::InvalidCredential.to_string(),
            ),
            AuthApiError::UserNotFound => (StatusCode::NOT_FOUND, "User not found".to_string()),
            AuthApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
