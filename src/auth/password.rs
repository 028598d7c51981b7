//! Password Hashing
//! Mission: Salted bcrypt hashing, kept off the async request threads

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;

/// bcrypt's accepted cost range; the crate keeps its own bounds private.
pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("bcrypt cost {0} outside {min}..={max}", min = MIN_COST, max = MAX_COST)]
    InvalidCost(u32),
    #[error("failed to hash password: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
    #[error("hash worker failed: {0}")]
    Worker(String),
}

/// One-way password hasher with a configurable bcrypt cost factor.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Result<Self, HashError> {
        if !(MIN_COST..=MAX_COST).contains(&cost) {
            return Err(HashError::InvalidCost(cost));
        }
        Ok(Self { cost })
    }

    /// Hash with a fresh random salt; the salt and cost are embedded in the output.
    pub fn hash(&self, password: &str) -> Result<String, HashError> {
        Ok(bcrypt::hash(password, self.cost)?)
    }

    /// Returns false for a wrong password and for anything that is not a bcrypt hash.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        bcrypt::verify(password, hash).unwrap_or(false)
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            cost: bcrypt::DEFAULT_COST,
        }
    }
}

/// Bounded pool for CPU-heavy hashing work.
///
/// Each job holds a semaphore permit while it runs on tokio's blocking
/// threads, so a burst of logins queues here instead of occupying the
/// request-handling workers.
#[derive(Clone)]
pub struct HashWorkers {
    permits: Arc<Semaphore>,
}

impl HashWorkers {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    pub async fn run<F, T>(&self, job: F) -> Result<T, HashError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        // The permit travels with the job: a dropped caller cannot free the slot early
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| HashError::Worker(e.to_string()))?;

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job()
        })
        .await
        .map_err(|e| HashError::Worker(e.to_string()))
    }
}
