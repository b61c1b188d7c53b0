//! # Leadline Shared Library
//!
//! This crate contains the types, database access, and auth utilities shared
//! by the Leadline API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and queries (users, campaigns, leads)
//! - `auth`: JWT tokens, password hashing, and request authentication
//! - `db`: Connection pool and migration runner

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the Leadline shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
