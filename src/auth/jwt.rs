//! JWT Token Service
//! Mission: Issue and verify signed, self-contained claims

use crate::auth::models::{Claims, UserResponse};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Why a token failed. Kept distinct for logs; clients only ever see "invalid or expired".
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature does not verify")]
    SignatureInvalid,
    #[error("token has expired")]
    Expired,
    #[error("failed to sign token: {0}")]
    Encoding(String),
}

/// Stateless HS256 token issuer/verifier over a process-wide secret.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self::with_ttl(secret, Duration::hours(DEFAULT_TOKEN_TTL_HOURS))
    }

    pub fn with_ttl(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    /// Issue a token for a user. Returns the token and its lifetime in seconds.
    pub fn issue(&self, user: &UserResponse) -> Result<(String, i64), TokenError> {
        self.issue_at(user, Utc::now())
    }

    pub(crate) fn issue_at(
        &self,
        user: &UserResponse,
        now: DateTime<Utc>,
    ) -> Result<(String, i64), TokenError> {
        let issued_at = now.timestamp();
        let claims = Claims {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
            issued_at,
            expires_at: issued_at + self.ttl.num_seconds(),
        };

        debug!(
            "Generating JWT for user {} ({}), expires in {}h",
            user.username,
            user.id,
            self.ttl.num_hours()
        );

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))?;

        Ok((token, self.ttl.num_seconds()))
    }

    /// Verify signature first, then expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    pub(crate) fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let decoded =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Malformed,
                }
            })?;

        // Decoder accepts exp == now; a token is only valid strictly before expiry.
        if now.timestamp() >= decoded.claims.expires_at {
            return Err(TokenError::Expired);
        }

        debug!("Validated JWT for user {}", decoded.claims.username);

        Ok(decoded.claims)
    }
}
