//! Credential Storage
//! Mission: Own every user record and the uniqueness rules over them

use crate::auth::models::{User, UserResponse, UserRole};
use crate::auth::password::{HashError, PasswordHasher};
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@taskmanager.com";
/// Documented initial password for the bootstrap admin. Not a secret.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin@123";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Username already exists")]
    UsernameTaken,
    #[error("Email already exists")]
    EmailTaken,
    #[error("Invalid username or password")]
    InvalidCredential,
    #[error(transparent)]
    Hashing(#[from] HashError),
}

struct Inner {
    users: BTreeMap<u64, User>,
    next_id: u64,
}

impl Inner {
    fn check_unique(&self, username: &str, email: &str) -> Result<(), StoreError> {
        for user in self.users.values() {
            if user.username == username {
                return Err(StoreError::UsernameTaken);
            }
            if user.email == email {
                return Err(StoreError::EmailTaken);
            }
        }
        Ok(())
    }

    fn insert(
        &mut self,
        username: &str,
        email: &str,
        password_hash: String,
        role: UserRole,
    ) -> User {
        let id = self.next_id;
        self.next_id += 1;

        let user = User {
            id,
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            role,
            created_at: Utc::now(),
        };
        self.users.insert(id, user.clone());
        user
    }
}

/// In-memory user registry keyed by sequential id.
///
/// Writers are serialized by the lock; uniqueness is re-checked under the
/// write lock so concurrent registrations of the same name cannot both land.
pub struct CredentialStore {
    inner: RwLock<Inner>,
    hasher: PasswordHasher,
    // Verified against when the username is unknown, so both failure paths cost one bcrypt.
    dummy_hash: String,
}

impl CredentialStore {
    pub fn new(hasher: PasswordHasher) -> Result<Self, StoreError> {
        let dummy_hash = hasher.hash("timing-equaliser")?;
        Ok(Self {
            inner: RwLock::new(Inner {
                users: BTreeMap::new(),
                next_id: 1,
            }),
            hasher,
            dummy_hash,
        })
    }

    /// Register a regular user
    pub fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<UserResponse, StoreError> {
        // Cheap early rejection before paying for bcrypt
        self.inner.read().check_unique(username, email)?;

        let password_hash = self.hasher.hash(password)?;

        let mut inner = self.inner.write();
        inner.check_unique(username, email)?;
        let user = inner.insert(username, email, password_hash, UserRole::User);
        drop(inner);

        info!(user_id = user.id, username = %user.username, "✅ Registered user");
        Ok(UserResponse::from(&user))
    }

    /// Check a username/password pair. Unknown user and wrong password are the same error.
    pub fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserResponse, StoreError> {
        let found = self
            .inner
            .read()
            .users
            .values()
            .find(|u| u.username == username)
            .map(|u| (UserResponse::from(u), u.password_hash.clone()));

        match found {
            Some((user, hash)) if self.hasher.verify(password, &hash) => Ok(user),
            Some(_) => {
                debug!(username = %username, "Password mismatch");
                Err(StoreError::InvalidCredential)
            }
            None => {
                let _ = self.hasher.verify(password, &self.dummy_hash);
                debug!(username = %username, "Unknown username");
                Err(StoreError::InvalidCredential)
            }
        }
    }

    pub fn get_by_id(&self, id: u64) -> Option<UserResponse> {
        self.inner.read().users.get(&id).map(UserResponse::from)
    }

    /// All users ordered by id
    pub fn list(&self) -> Vec<UserResponse> {
        self.inner
            .read()
            .users
            .values()
            .map(UserResponse::from)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Create the default admin if the store is empty. Returns the admin when one was created.
    pub fn bootstrap_admin(&self) -> Result<Option<UserResponse>, StoreError> {
        if !self.is_empty() {
            return Ok(None);
        }

        let password_hash = self.hasher.hash(DEFAULT_ADMIN_PASSWORD)?;

        let mut inner = self.inner.write();
        if !inner.users.is_empty() {
            return Ok(None);
        }
        let admin = inner.insert(
            DEFAULT_ADMIN_USERNAME,
            DEFAULT_ADMIN_EMAIL,
            password_hash,
            UserRole::Admin,
        );
        drop(inner);

        info!(
            "🔐 Default admin user created (username: {})",
            DEFAULT_ADMIN_USERNAME
        );
        warn!("⚠️  CHANGE DEFAULT PASSWORD IN PRODUCTION!");

        Ok(Some(UserResponse::from(&admin)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::MIN_COST;
    use std::sync::Arc;

    fn create_test_store() -> CredentialStore {
        CredentialStore::new(PasswordHasher::new(MIN_COST).unwrap()).unwrap()
    }

    #[test]
    fn test_register_assigns_sequential_ids() {
        let store = create_test_store();

        let first = store.register("alice", "alice@x.com", "pw12345").unwrap();
        let second = store.register("bob", "bob@x.com", "pw12345").unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.role, UserRole::User);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let store = create_test_store();
        store.register("testuser", "a@x.com", "testpass123").unwrap();

        let err = store
            .register("testuser", "b@x.com", "testpass123")
            .unwrap_err();
        assert!(matches!(err, StoreError::UsernameTaken));

        let matching = store.list().into_iter().filter(|u| u.username == "testuser").count();
        assert_eq!(matching, 1);
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let store = create_test_store();
        store.register("first", "same@x.com", "pw").unwrap();

        let err = store.register("second", "same@x.com", "pw").unwrap_err();
        assert!(matches!(err, StoreError::EmailTaken));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_uniqueness_is_case_sensitive() {
        let store = create_test_store();
        store.register("Alice", "Alice@x.com", "pw").unwrap();
        assert!(store.register("alice", "alice@x.com", "pw").is_ok());
    }

    #[test]
    fn test_rejected_registration_does_not_consume_id() {
        let store = create_test_store();
        store.register("alice", "alice@x.com", "pw").unwrap();
        assert!(store.register("alice", "other@x.com", "pw").is_err());

        let bob = store.register("bob", "bob@x.com", "pw").unwrap();
        assert_eq!(bob.id, 2);
    }

    #[test]
    fn test_authenticate() {
        let store = create_test_store();
        let registered = store.register("testuser", "t@x.com", "testpass123").unwrap();

        let user = store.authenticate("testuser", "testpass123").unwrap();
        assert_eq!(user, registered);
    }

    #[test]
    fn test_authenticate_failures_are_identical() {
        let store = create_test_store();
        store.register("testuser", "t@x.com", "testpass123").unwrap();

        let wrong_password = store.authenticate("testuser", "nope").unwrap_err();
        let unknown_user = store.authenticate("ghost", "testpass123").unwrap_err();

        assert!(matches!(wrong_password, StoreError::InvalidCredential));
        assert!(matches!(unknown_user, StoreError::InvalidCredential));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[test]
    fn test_get_by_id() {
        let store = create_test_store();
        let user = store.register("alice", "alice@x.com", "pw").unwrap();

        assert_eq!(store.get_by_id(user.id), Some(user));
        assert_eq!(store.get_by_id(99), None);
    }

    #[test]
    fn test_bootstrap_admin_is_idempotent() {
        let store = create_test_store();

        let admin = store.bootstrap_admin().unwrap().unwrap();
        assert_eq!(admin.id, 1);
        assert_eq!(admin.username, DEFAULT_ADMIN_USERNAME);
        assert_eq!(admin.role, UserRole::Admin);

        assert!(store.bootstrap_admin().unwrap().is_none());
        let admins = store.list().into_iter().filter(|u| u.role == UserRole::Admin).count();
        assert_eq!(admins, 1);

        let logged_in = store
            .authenticate(DEFAULT_ADMIN_USERNAME, DEFAULT_ADMIN_PASSWORD)
            .unwrap();
        assert_eq!(logged_in.role, UserRole::Admin);
    }

    #[test]
    fn test_bootstrap_admin_skips_populated_store() {
        let store = create_test_store();
        store.register("alice", "alice@x.com", "pw").unwrap();

        assert!(store.bootstrap_admin().unwrap().is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_concurrent_registration_single_winner() {
        let store = Arc::new(create_test_store());

        let results: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let store = store.clone();
                    scope.spawn(move || store.register("racer", &format!("racer{i}@x.com"), "pw"))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, StoreError::UsernameTaken)));
        assert_eq!(store.len(), 1);
    }
}
