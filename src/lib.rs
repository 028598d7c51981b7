//! Taskgate Backend Library
//!
//! Authentication and access control for the task manager API.
//! The binary in `main.rs` only wires configuration, logging and the listener.

pub mod app;
pub mod auth;
pub mod config;
pub mod middleware;

pub use app::{build_router, build_state};
pub use config::Config;
