//! Process configuration
//! Mission: One validated set of settings, read from flags or environment at start

use crate::auth::password::{MAX_COST, MIN_COST};
use anyhow::{bail, Context, Result};
use clap::Parser;
use std::net::SocketAddr;

pub const DEV_SECRET_KEY: &str = "dev-secret-key-change-in-production";

#[derive(Debug, Clone, Parser)]
#[command(name = "taskgate", about = "Task manager API with token authentication")]
pub struct Config {
    /// Address the HTTP server binds to
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:5000")]
    pub bind: SocketAddr,

    /// HS256 signing secret. Changing it invalidates every issued token.
    #[arg(long, env = "SECRET_KEY", default_value = DEV_SECRET_KEY, hide_env_values = true)]
    pub secret_key: String,

    /// Token lifetime in hours
    #[arg(long, env = "JWT_EXPIRATION_HOURS", default_value_t = 24)]
    pub token_ttl_hours: i64,

    /// bcrypt cost factor
    #[arg(long, env = "BCRYPT_COST", default_value_t = bcrypt::DEFAULT_COST)]
    pub bcrypt_cost: u32,

    /// Maximum concurrent password hashing jobs (defaults to available cores)
    #[arg(long, env = "HASH_WORKERS")]
    pub hash_workers: Option<usize>,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.secret_key.trim().is_empty() {
            bail!("SECRET_KEY must not be empty");
        }
        if self.token_ttl_hours <= 0 {
            bail!(
                "JWT_EXPIRATION_HOURS must be positive, got {}",
                self.token_ttl_hours
            );
        }
        self.token_ttl()?;
        if !(MIN_COST..=MAX_COST).contains(&self.bcrypt_cost) {
            bail!(
                "BCRYPT_COST must be within {}..={}, got {}",
                MIN_COST,
                MAX_COST,
                self.bcrypt_cost
            );
        }
        if self.hash_workers == Some(0) {
            bail!("HASH_WORKERS must be at least 1");
        }
        Ok(())
    }

    /// Token lifetime as a duration; fails instead of overflowing on absurd hour counts.
    pub fn token_ttl(&self) -> Result<chrono::Duration> {
        chrono::Duration::try_hours(self.token_ttl_hours).with_context(|| {
            format!(
                "JWT_EXPIRATION_HOURS is out of range, got {}",
                self.token_ttl_hours
            )
        })
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.secret_key == DEV_SECRET_KEY
    }

    pub fn hash_worker_count(&self) -> usize {
        self.hash_workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        })
    }
}
