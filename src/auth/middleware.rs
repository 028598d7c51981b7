//! Authentication Middleware
//! Mission: Gate protected routes on a valid bearer token and, optionally, a role

use crate::auth::{
    jwt::TokenService,
    models::{Claims, UserRole},
};
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// Why a request was turned away before reaching its handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingToken,
    MalformedHeader,
    InvalidOrExpired,
    InsufficientRole,
}

impl Rejection {
    pub fn status(&self) -> StatusCode {
        match self {
            Rejection::InsufficientRole => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Rejection::MissingToken => "Authentication token is missing",
            Rejection::MalformedHeader => "Invalid authorization header format",
            Rejection::InvalidOrExpired => "Invalid or expired token",
            Rejection::InsufficientRole => "Insufficient permissions",
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.message() }))).into_response()
    }
}

/// Pull the token out of `Authorization: Bearer <token>`.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, Rejection> {
    let value = headers.get(AUTHORIZATION).ok_or(Rejection::MissingToken)?;
    let value = value.to_str().map_err(|_| Rejection::MalformedHeader)?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or(Rejection::MalformedHeader)?;
    if token.is_empty() || token.chars().any(char::is_whitespace) {
        return Err(Rejection::MalformedHeader);
    }
    Ok(token)
}

/// Token verification plus role policy. Holds no state beyond the shared token service.
#[derive(Clone)]
pub struct AccessControl {
    tokens: Arc<TokenService>,
}

impl AccessControl {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }

    pub fn authenticate_only(&self, headers: &HeaderMap) -> Result<Claims, Rejection> {
        let token = extract_bearer(headers)?;
        self.tokens.verify(token).map_err(|e| {
            debug!(reason = %e, "Rejected bearer token");
            Rejection::InvalidOrExpired
        })
    }

    pub fn require_role(&self, headers: &HeaderMap, role: UserRole) -> Result<Claims, Rejection> {
        let claims = self.authenticate_only(headers)?;
        if claims.role != role {
            debug!(
                username = %claims.username,
                role = %claims.role,
                required = %role,
                "Rejected for role"
            );
            return Err(Rejection::InsufficientRole);
        }
        Ok(claims)
    }

    pub fn authorize(
        &self,
        headers: &HeaderMap,
        required_role: Option<UserRole>,
    ) -> Result<Claims, Rejection> {
        match required_role {
            Some(role) => self.require_role(headers, role),
            None => self.authenticate_only(headers),
        }
    }
}

/// Middleware state: an access policy bound to one group of routes.
#[derive(Clone)]
pub struct AccessGate {
    control: AccessControl,
    required_role: Option<UserRole>,
}

impl AccessGate {
    /// Any valid token passes
    pub fn authenticated(tokens: Arc<TokenService>) -> Self {
        Self {
            control: AccessControl::new(tokens),
            required_role: None,
        }
    }

    /// Valid token whose role matches exactly
    pub fn require(tokens: Arc<TokenService>, role: UserRole) -> Self {
        Self {
            control: AccessControl::new(tokens),
            required_role: Some(role),
        }
    }
}

/// Auth middleware that validates JWT tokens and enforces the gate's role
pub async fn auth_middleware(
    State(gate): State<AccessGate>,
    mut req: Request,
    next: Next,
) -> Result<Response, Rejection> {
    let claims = gate.control.authorize(req.headers(), gate.required_role)?;

    // Add claims to request extensions so handlers can access them
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
