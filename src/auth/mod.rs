//! Authentication Module
//! Mission: Credential storage, password hashing, JWT issuance and route gating

pub mod api;
pub mod credential_store;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;

pub use api::AuthState;
pub use credential_store::CredentialStore;
pub use jwt::TokenService;
pub use middleware::{auth_middleware, AccessControl, AccessGate, Rejection};
pub use password::{HashWorkers, PasswordHasher};
