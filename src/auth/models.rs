//! Authentication Models
//! Mission: Define user records, roles and token claims

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored user account. Only `CredentialStore` builds these.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt hash - never serialize
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

/// User roles for RBAC
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum UserRole {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "admin")]
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT Claims payload
///
/// A projection of the `User` at issuance time. Field names on the wire follow
/// the registered JWT claim names so the decoder can validate `exp`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub user_id: u64,
    pub username: String,
    pub role: UserRole,
    #[serde(rename = "iat")]
    pub issued_at: i64,
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

/// Register request body. Fields are optional so missing ones can be reported
/// as a validation error instead of a deserializer rejection.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Login request body
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: i64, // seconds until expiration
    pub user: UserResponse,
}

/// User response (sanitized)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Names of required fields that are absent, null or blank.
pub fn missing_fields<'a>(fields: &[(&'a str, Option<&str>)]) -> Vec<&'a str> {
    fields
        .iter()
        .filter(|(_, value)| value.map_or(true, |v| v.trim().is_empty()))
        .map(|(name, _)| *name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: 7,
            username: "testuser".to_string(),
            email: "test@example.com".to_string(),
            password_hash: "$2b$04$secret".to_string(),
            role: UserRole::User,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_user_role_serialization() {
        let admin = UserRole::Admin;
        let json = serde_json::to_string(&admin).unwrap();
        assert_eq!(json, r#""admin""#);

        let user: UserRole = serde_json::from_str(r#""user""#).unwrap();
        assert_eq!(user, UserRole::User);
    }

    #[test]
    fn test_user_role_string_conversion() {
        assert_eq!(UserRole::Admin.as_str(), "admin");
        assert_eq!(UserRole::User.to_string(), "user");
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let json = serde_json::to_value(sample_user()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "testuser");

        let response = serde_json::to_string(&UserResponse::from(&sample_user())).unwrap();
        assert!(!response.contains("secret"));
    }

    #[test]
    fn test_claims_use_registered_names() {
        let claims = Claims {
            user_id: 1,
            username: "alice".to_string(),
            role: UserRole::User,
            issued_at: 100,
            expires_at: 200,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["iat"], 100);
        assert_eq!(json["exp"], 200);
        assert_eq!(json["role"], "user");
    }

    #[test]
    fn test_missing_fields_lists_blank_and_absent() {
        let missing = missing_fields(&[
            ("username", Some("bob")),
            ("email", None),
            ("password", Some("   ")),
        ]);
        assert_eq!(missing, vec!["email", "password"]);

        assert!(missing_fields(&[("username", Some("bob"))]).is_empty());
    }
}
